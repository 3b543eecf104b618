pub mod retirement_manager;
