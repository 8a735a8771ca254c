/// Result of recording a like. A repeated pair is accepted without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Created,
    AlreadyLiked,
}

impl LikeOutcome {
    pub fn created(self) -> bool {
        matches!(self, Self::Created)
    }
}
