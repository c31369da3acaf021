pub mod request;
pub mod response;
pub mod seed;
pub mod view;
