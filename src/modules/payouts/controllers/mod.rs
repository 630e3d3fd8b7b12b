pub mod payout_controller;
