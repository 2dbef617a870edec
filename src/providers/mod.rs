pub mod fetcher;
pub mod fred;
pub mod sendgrid;
