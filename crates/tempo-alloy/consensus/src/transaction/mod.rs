//! Tempo transaction envelope codec.

mod authorization;
pub use authorization::TempoSignedAuthorization;

mod call;
pub use call::Call;

mod error;
pub use error::TempoTxError;

mod key_authorization;
pub use key_authorization::{KeyAuthorization, TokenLimit};

mod tempo;
pub use tempo::{FeePayerSignature, FeePayerSlot, SerializeOptions, TxTempo};

mod tx_type;
pub use tx_type::{FEE_PAYER_TX_TYPE_ID, TEMPO_TX_TYPE_ID, TempoTxType};
