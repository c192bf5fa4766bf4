//! Services module
//!
//! Este módulo contiene la lógica de negocio pura del sistema: totales y
//! estado de pedidos, asignación de horarios de visita, agregación del
//! dashboard y renderizado de plantillas.

pub mod dashboard;
pub mod order_status;
pub mod order_totals;
pub mod slot_allocator;
pub mod template_service;
