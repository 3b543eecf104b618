/// Which acknowledgment stages a caller asked to wait for when sending
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AckStages {
    pub sent: bool,
    pub received: bool,
    pub completed: bool,
    pub retired: bool,
}

impl AckStages {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            sent: true,
            received: true,
            completed: true,
            retired: true,
        }
    }

    pub fn any(&self) -> bool {
        self.sent || self.received || self.completed || self.retired
    }
}
