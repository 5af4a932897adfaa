pub mod controller;

pub use controller::FeedbackController;
