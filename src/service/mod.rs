pub mod assistant_service;
