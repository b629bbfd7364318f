/// External engine contract
pub mod engine;
/// Ledger connectivity passed to the engine
pub mod ledger;
/// Signing capability and strategies
pub mod signer;

pub use engine::{
	DepositRequest, Engine, EngineError, OperationContext, OperationOutcome, SpentIndex,
	WithdrawRequest,
};
pub use ledger::{LedgerAccess, LedgerConnection, RpcEndpoint};
pub use signer::{
	ExternalSigner, LocalKeypairSigner, SignedTransaction, SignerError, SigningStrategy,
	TransactionSigner, UnsignedTransaction,
};
