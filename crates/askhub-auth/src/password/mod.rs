//! Password hashing, generation, and policy enforcement.

pub mod generator;
pub mod hasher;
pub mod validator;

pub use generator::PasswordGenerator;
pub use hasher::PasswordHasher;
pub use validator::PasswordValidator;
