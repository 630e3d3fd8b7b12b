pub mod summary_controller;
