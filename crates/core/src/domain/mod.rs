pub mod classification;
pub mod intent;
pub mod response;
pub mod session;
