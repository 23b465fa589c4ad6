use super::repo_tx_mysql::MySqlTx;
use crate::domain_port::*;
use sqlx::mysql::MySqlDatabaseError;

/// Every `StorageTx` handed to a MySQL repo was opened by `MySqlTxManager`.
pub fn downcast<'a, 't>(tx: &'a mut dyn StorageTx<'t>) -> &'a mut MySqlTx<'t> {
    unsafe {
        let p = tx as *mut dyn StorageTx<'t>;
        let p = p as *mut MySqlTx<'t>;
        &mut *p
    }
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

/// Name of the unique key behind an ER_DUP_ENTRY, e.g. `user.uk_user_email`.
pub fn dup_key_name(err: &sqlx::Error) -> Option<String> {
    if !is_dup_key(err) {
        return None;
    }
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    // "Duplicate entry 'x' for key 'user.uk_user_email'"
    let message = db.message();
    let (_, tail) = message.rsplit_once(" for key ")?;
    Some(tail.trim_matches('\'').to_string())
}
