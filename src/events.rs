/// Event kind marking the first sample of a new section
pub const SEGMENT_BREAK: u16 = 0x7ffe;

/// Event kinds below this value are user annotations with a text description
pub const ANNOTATION_KIND_LIMIT: u16 = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: u16,
    /// 绝对样本位置
    pub position: usize,
    pub duration: usize,
    pub channel: u16,
    pub description: String,
}

impl Event {
    /// Creates a segment-break marker at `position`
    pub fn segment_break(position: usize) -> Self {
        Event {
            kind: SEGMENT_BREAK,
            position,
            duration: 0,
            channel: 0,
            description: String::new(),
        }
    }

    /// Creates a user annotation
    pub fn annotation(kind: u16, position: usize, description: &str) -> Self {
        Event {
            kind,
            position,
            duration: 0,
            channel: 0,
            description: description.to_string(),
        }
    }

    pub fn is_segment_break(&self) -> bool {
        self.kind == SEGMENT_BREAK
    }

    pub fn is_annotation(&self) -> bool {
        self.kind < ANNOTATION_KIND_LIMIT
    }
}

/// Sparse event list with the sample rate its positions refer to
#[derive(Debug, Clone, PartialEq)]
pub struct EventTable {
    sample_rate: f64,
    events: Vec<Event>,
}

impl EventTable {
    pub fn new(sample_rate: f64) -> Self {
        EventTable {
            sample_rate,
            events: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Sorts by position; events at the same position keep their order
    pub fn sort_by_position(&mut self) {
        self.events.sort_by_key(|e| e.position);
    }

    pub fn is_sorted(&self) -> bool {
        self.events.windows(2).all(|w| w[0].position <= w[1].position)
    }

    /// Positions of all segment-break markers, in table order
    pub fn segment_breaks(&self) -> impl Iterator<Item = usize> + '_ {
        self.events
            .iter()
            .filter(|e| e.is_segment_break())
            .map(|e| e.position)
    }
}

impl<'a> IntoIterator for &'a EventTable {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
