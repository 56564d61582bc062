//! A document: the three top-level control lists the generator lays out.

use crate::control::Control;

/// One of the three page zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Header,
    Body,
    Footer,
}

/// Resolved control tree grouped by zone. Header and footer repeat on every
/// page; the body flows across as many pages as it needs.
#[derive(Default)]
pub struct Document {
    pub header: Vec<Box<dyn Control>>,
    pub body: Vec<Box<dyn Control>>,
    pub footer: Vec<Box<dyn Control>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, zone: Zone, control: impl Control + 'static) -> &mut Self {
        self.zone_mut(zone).push(Box::new(control));
        self
    }

    pub fn push_boxed(&mut self, zone: Zone, control: Box<dyn Control>) -> &mut Self {
        self.zone_mut(zone).push(control);
        self
    }

    pub fn zone(&self, zone: Zone) -> &[Box<dyn Control>] {
        match zone {
            Zone::Header => &self.header,
            Zone::Body => &self.body,
            Zone::Footer => &self.footer,
        }
    }

    pub fn zone_mut(&mut self, zone: Zone) -> &mut Vec<Box<dyn Control>> {
        match zone {
            Zone::Header => &mut self.header,
            Zone::Body => &mut self.body,
            Zone::Footer => &mut self.footer,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.body.is_empty() && self.footer.is_empty()
    }
}
