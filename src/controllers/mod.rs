//! Controladores: orquestan repositorios, servicios y clientes externos

pub mod dashboard_controller;
pub mod order_controller;
pub mod payment_controller;
pub mod quotation_controller;
pub mod visit_controller;
