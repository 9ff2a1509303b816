mod email;
pub use email::EmailObject;
