use super::{
    DynamicAgingRoundRobin, FirstComeFirstServed, HighestResponseRatioNext, Lottery,
    LongestJobNext, LongestRemainingTime, Policy, PolicyParams, PreemptivePriority, Priority,
    RoundRobin, ShortestJobNext, ShortestRemainingTime,
};
use crate::error::SimError;

pub type PolicyCtor = fn(&PolicyParams) -> Box<dyn Policy>;

/// Ordered mapping from policy key to constructor.
///
/// Iteration follows registration order so reports come out in the same
/// order every run.
#[derive(Clone, Default)]
pub struct PolicyRegistry {
    entries: Vec<(&'static str, PolicyCtor)>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every policy this crate ships.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("fcfs", |_| Box::new(FirstComeFirstServed));
        registry.register("sjn", |_| Box::new(ShortestJobNext));
        registry.register("ljn", |_| Box::new(LongestJobNext));
        registry.register("priority", |_| Box::new(Priority));
        registry.register("priority_preemptive", |_| Box::new(PreemptivePriority));
        registry.register("srt", |_| Box::new(ShortestRemainingTime));
        registry.register("lrt", |_| Box::new(LongestRemainingTime));
        registry.register("rr", |params| Box::new(RoundRobin::new(params.rr_quantum)));
        registry.register("hrrn", |_| Box::new(HighestResponseRatioNext));
        registry.register("lottery", |params| {
            Box::new(Lottery::new(params.lottery_quantum, params.seed))
        });
        registry.register("dyn_aging_rr", |params| {
            Box::new(DynamicAgingRoundRobin::new(params.aging.clone()))
        });
        registry
    }

    /// Adds `name`, replacing any constructor already registered under it
    /// without changing its position.
    pub fn register(&mut self, name: &'static str, ctor: PolicyCtor) {
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = ctor,
            None => self.entries.push((name, ctor)),
        }
    }

    pub fn get(&self, name: &str) -> Option<PolicyCtor> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, ctor)| *ctor)
    }

    pub fn build(&self, name: &str, params: &PolicyParams) -> Result<Box<dyn Policy>, SimError> {
        self.get(name)
            .map(|ctor| ctor(params))
            .ok_or_else(|| SimError::UnknownPolicy(name.to_owned()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, PolicyCtor)> + '_ {
        self.entries.iter().copied()
    }

    /// Registry restricted to `names`, still in registration order.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, SimError> {
        if let Some(unknown) = names.iter().find(|name| self.get(name.as_ref()).is_none()) {
            return Err(SimError::UnknownPolicy(unknown.as_ref().to_owned()));
        }
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| names.iter().any(|name| name.as_ref() == *key))
            .copied()
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
