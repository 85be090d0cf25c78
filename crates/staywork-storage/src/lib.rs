//! Object storage backends
//!
//! Bucket-addressed object storage behind the [`ObjectStorage`] trait. The
//! public bucket serves approved images, the private bucket holds everything
//! else. There is no atomic cross-bucket move primitive; callers compose
//! copy-then-delete themselves.

pub mod factory;
pub mod local;
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{Bucket, ObjectStorage, StorageError, StorageResult};
