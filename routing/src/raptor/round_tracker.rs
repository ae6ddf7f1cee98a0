/// Round 0 holds the access arrivals, round k the arrivals after k transit legs
#[derive(Debug, Clone)]
pub(crate) struct RoundTracker {
    round: usize,
    number_of_rounds: usize,
}

impl RoundTracker {
    pub fn new(number_of_rounds: usize) -> Self {
        Self { round: 0, number_of_rounds }
    }

    pub fn setup_iteration(&mut self) {
        self.round = 0;
    }

    pub fn has_more_rounds(&self) -> bool {
        self.round < self.number_of_rounds
    }

    pub fn next_round(&mut self) -> usize {
        debug_assert!(self.has_more_rounds());
        self.round += 1;
        self.round
    }

    pub fn round(&self) -> usize {
        self.round
    }
}
