use workify_auth::Caller;

/// Authenticated identity for a request, attached by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    caller: Caller,
}

impl CallerContext {
    pub fn new(caller: Caller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn email(&self) -> &str {
        self.caller.email()
    }
}
