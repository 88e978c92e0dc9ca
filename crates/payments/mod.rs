pub mod mercado_pago_client;
