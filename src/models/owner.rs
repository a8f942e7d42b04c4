/// Verified tenant identity, derived from the subject claim of a verified
/// bearer token by the authentication middleware. Never constructed from
/// request-body fields.
#[derive(Debug, Clone)]
pub struct Owner {
    pub id: String,
}

impl Owner {
    pub fn new(id: String) -> Self {
        Self { id }
    }
}
