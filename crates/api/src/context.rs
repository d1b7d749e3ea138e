use bazaar_core::UserId;

/// Buyer identity for a request.
///
/// Issued by an upstream gateway; this service trusts it as given.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuyerContext {
    user_id: UserId,
}

impl BuyerContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
