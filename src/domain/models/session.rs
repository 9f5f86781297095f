/// Who is talking to the assistant. Authentication itself happens elsewhere,
/// this only carries the outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<String>,
    pub team_id: Option<String>,
    pub access_token: Option<String>,
    pub auth_required: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        return self.user_id.is_some();
    }

    /// Whether a submission may start a generation.
    pub fn can_generate(&self) -> bool {
        return !self.auth_required || self.is_authenticated();
    }

    pub fn login(&mut self, user_id: &str, team_id: Option<String>, access_token: Option<String>) {
        self.user_id = Some(user_id.to_string());
        self.team_id = team_id;
        self.access_token = access_token;
    }

    pub fn logout(&mut self) {
        self.user_id = None;
        self.team_id = None;
        self.access_token = None;
    }
}
