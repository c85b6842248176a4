pub mod table_manager_test;
pub mod view_orchestrator_test;
