//! Named hook chains
//!
//! A hook chain is an ordered list of handlers that see an inbound value
//! before the coordinator's own logic does. Each hook either consumes the
//! value ([`Flow::Halt`]) or hands it, unmodified, to the next hook
//! ([`Flow::Continue`]). Whatever survives the whole chain goes to the
//! coordinator's regular handler.
//!
//! ```text
//! value ─▶ hook 1 ──Continue──▶ hook 2 ──Continue──▶ View::handle_*
//!            │                    │
//!          Halt                 Halt
//! ```

use smallvec::SmallVec;

use crate::error::{Result, TetherError};

/// What a hook did with the value it was given
#[derive(Debug, PartialEq, Eq)]
pub enum Flow<T> {
    /// Consumed; stop running the chain
    Halt,
    /// Not mine; pass the value on
    Continue(T),
}

/// A hook over state `S` and inbound values `T`
pub type Hook<S, T> = Box<dyn FnMut(&mut S, T) -> Result<Flow<T>>>;

/// Ordered, named list of hooks
pub struct HookChain<S, T> {
    hooks: SmallVec<[(String, Hook<S, T>); 4]>,
}

impl<S, T> Default for HookChain<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> HookChain<S, T> {
    pub fn new() -> Self {
        Self {
            hooks: SmallVec::new(),
        }
    }

    /// Append a hook. Names are unique within a chain.
    pub fn attach<F>(&mut self, name: impl Into<String>, hook: F) -> Result<()>
    where
        F: FnMut(&mut S, T) -> Result<Flow<T>> + 'static,
    {
        let name = name.into();
        if self.contains(&name) {
            return Err(TetherError::DuplicateHook(name));
        }
        self.hooks.push((name, Box::new(hook)));
        Ok(())
    }

    /// Remove a hook by name; returns whether one was attached
    pub fn detach(&mut self, name: &str) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(existing, _)| existing != name);
        self.hooks.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.iter().any(|(existing, _)| existing == name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the chain in attach order
    ///
    /// Errors from a hook abort the chain and are returned as-is.
    pub fn run(&mut self, state: &mut S, value: T) -> Result<Flow<T>> {
        let mut value = value;
        for (_, hook) in self.hooks.iter_mut() {
            match hook(state, value)? {
                Flow::Halt => return Ok(Flow::Halt),
                Flow::Continue(next) => value = next,
            }
        }
        Ok(Flow::Continue(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_continues() {
        let mut chain: HookChain<(), u32> = HookChain::new();
        assert_eq!(chain.run(&mut (), 3).unwrap(), Flow::Continue(3));
    }

    #[test]
    fn test_hooks_run_in_order_until_halt() {
        let mut chain: HookChain<Vec<&'static str>, u32> = HookChain::new();
        chain
            .attach("odd", |log: &mut Vec<&'static str>, n: u32| {
                log.push("odd");
                Ok(if n % 2 == 1 { Flow::Halt } else { Flow::Continue(n) })
            })
            .unwrap();
        chain
            .attach("any", |log: &mut Vec<&'static str>, n: u32| {
                log.push("any");
                Ok(Flow::Continue(n))
            })
            .unwrap();

        let mut log = Vec::new();
        assert_eq!(chain.run(&mut log, 1).unwrap(), Flow::Halt);
        assert_eq!(log, vec!["odd"]);

        log.clear();
        assert_eq!(chain.run(&mut log, 2).unwrap(), Flow::Continue(2));
        assert_eq!(log, vec!["odd", "any"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut chain: HookChain<(), u32> = HookChain::new();
        chain.attach("tether", |_: &mut (), n| Ok(Flow::Continue(n))).unwrap();
        let err = chain
            .attach("tether", |_: &mut (), n| Ok(Flow::Continue(n)))
            .unwrap_err();
        assert!(matches!(err, TetherError::DuplicateHook(name) if name == "tether"));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_detach() {
        let mut chain: HookChain<(), u32> = HookChain::new();
        chain.attach("a", |_: &mut (), _| Ok(Flow::Halt)).unwrap();
        assert!(chain.detach("a"));
        assert!(!chain.detach("a"));
        assert!(chain.is_empty());
        assert_eq!(chain.run(&mut (), 9).unwrap(), Flow::Continue(9));
    }

    #[test]
    fn test_error_aborts_chain() {
        let mut chain: HookChain<u32, u32> = HookChain::new();
        chain
            .attach("fail", |_: &mut u32, _| Err(TetherError::MailboxClosed))
            .unwrap();
        chain
            .attach("count", |calls: &mut u32, n| {
                *calls += 1;
                Ok(Flow::Continue(n))
            })
            .unwrap();

        let mut calls = 0;
        assert!(chain.run(&mut calls, 1).is_err());
        assert_eq!(calls, 0);
    }
}
