pub mod permanence_service;
