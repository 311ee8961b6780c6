/// Capability labels carried in a token's `scope` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Read,
    Write,
    Admin,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Read => "read",
            Scope::Write => "write",
            Scope::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope a JSON-RPC method needs, `None` when it is open to any
/// authenticated caller.
pub fn required_scope(method: &str) -> Option<Scope> {
    match method {
        "resources/read" => Some(Scope::Read),
        "tools/call" => Some(Scope::Write),
        _ => None,
    }
}
