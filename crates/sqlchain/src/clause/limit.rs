/// `LIMIT n` or `LIMIT offset, n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitClause {
    count: u64,
    offset: Option<u64>,
}

impl LimitClause {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            offset: None,
        }
    }

    pub fn with_offset(offset: u64, count: u64) -> Self {
        Self {
            count,
            offset: Some(offset),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn render(&self) -> String {
        match self.offset {
            Some(offset) => format!("LIMIT {offset}, {}", self.count),
            None => format!("LIMIT {}", self.count),
        }
    }
}
