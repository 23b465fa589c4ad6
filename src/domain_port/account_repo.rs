use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find_by_id(&self, user_id: UserId) -> Result<Account, RelationError>;

    /// Like `find_by_id`, but holds the account locked until `tx` ends.
    async fn find_by_id_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Account, RelationError>;

    /// Applies `update` atomically and returns the account as it is afterwards.
    async fn update_sets_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        update: &SetUpdate,
    ) -> Result<Account, RelationError>;
}
