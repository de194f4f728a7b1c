pub mod auth_verifier;
pub mod identity_remover;
pub mod orchestrator;
pub mod record_cleaner;
pub mod storage_cleaner;

#[cfg(test)]
pub(crate) mod test_support;
