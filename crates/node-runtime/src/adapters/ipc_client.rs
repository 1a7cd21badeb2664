//! Builds the signed `AuthenticatedMessage<T>` envelopes the gap-router
//! adapters send into each sibling's IPC handler. This is the send-side
//! counterpart of the `authorize()` helper every `*Handler` already runs
//! on receipt — grounded on the identical construction used in each
//! sibling's own handler test module (e.g.
//! `traffic_accountant::handler::ipc_handler::tests::signed_message`),
//! generalized here into one reusable helper instead of being duplicated
//! per test module.

use shared_types::entities::SubsystemId;
use shared_types::envelope::AuthenticatedMessage;
use shared_types::security::{current_timestamp, sign_message, DerivedKeyProvider, KeyProvider};
use uuid::Uuid;

#[derive(Clone)]
pub struct IpcSigner {
    sender_id: SubsystemId,
    keys: DerivedKeyProvider,
}

impl IpcSigner {
    pub fn new(sender_id: SubsystemId, keys: DerivedKeyProvider) -> Self {
        Self { sender_id, keys }
    }

    /// Signs `payload` for `recipient_id`, returning the envelope plus the
    /// exact bytes the recipient's verifier must hash the signature over.
    pub fn sign<T: serde::Serialize + Clone>(&self, recipient_id: SubsystemId, payload: T) -> (AuthenticatedMessage<T>, Vec<u8>) {
        let secret = self
            .keys
            .get_shared_secret(self.sender_id)
            .expect("a DerivedKeyProvider always returns a secret for any subsystem id");

        let mut message = AuthenticatedMessage {
            version: AuthenticatedMessage::<T>::CURRENT_VERSION,
            sender_id: self.sender_id,
            recipient_id,
            correlation_id: Uuid::new_v4(),
            reply_to: None,
            timestamp: current_timestamp(),
            nonce: Uuid::new_v4(),
            signature: [0u8; 64],
            payload,
        };
        let unsigned_bytes = bincode::serialize(&message).expect("AuthenticatedMessage<T> is always serializable");
        message.signature = sign_message(&unsigned_bytes, &secret);
        let signed_bytes = bincode::serialize(&message).expect("AuthenticatedMessage<T> is always serializable");
        (message, signed_bytes)
    }
}
