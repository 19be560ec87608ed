use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use uuid::Uuid;

/// Random-id generation behind a capability so tests can swap in a
/// deterministic source.
pub trait TokenSource: Send + Sync {
    /// Opaque public identifier granting read access to a published post.
    fn share_token(&self) -> String;

    /// Stable identifier minted for a guest without one of their own.
    fn guest_identifier(&self) -> String;

    /// Short prefixed id for a top-level comment ("c" + 8 hex chars).
    /// No collision check; the probability is treated as negligible.
    fn comment_id(&self) -> String;

    /// Short prefixed id for a reply ("r" + 8 hex chars).
    fn reply_id(&self) -> String;
}

pub struct RandomTokens;

fn url_safe_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut encoded = URL_SAFE_NO_PAD.encode(&bytes);
    encoded.truncate(len);
    encoded
}

fn short_id(prefix: char) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &hex[..8])
}

impl TokenSource for RandomTokens {
    fn share_token(&self) -> String {
        url_safe_token(16)
    }

    fn guest_identifier(&self) -> String {
        url_safe_token(12)
    }

    fn comment_id(&self) -> String {
        short_id('c')
    }

    fn reply_id(&self) -> String {
        short_id('r')
    }
}
