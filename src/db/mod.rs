pub mod db;
pub mod propertydb;
pub mod userdb;
pub mod verificationdb;

use async_trait::async_trait;

pub use db::DBClient;
pub use propertydb::PropertyExt;
pub use userdb::UserExt;
pub use verificationdb::VerificationExt;

/// Everything the handlers and the workflow engine need from persistence.
///
/// `AppState` holds it as `Arc<dyn Store>` so the Postgres client can be
/// swapped for another backend.
#[async_trait]
pub trait Store: UserExt + PropertyExt + VerificationExt + Send + Sync {
    /// True when the backing database answers a trivial query.
    async fn ping(&self) -> bool;
}
