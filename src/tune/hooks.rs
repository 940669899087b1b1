use std::any::Any;
use std::collections::HashMap;

use crate::arg::{ArgMap, ArgValue};
use crate::error::Error;

/// Tuner-level hook run before a measured launch. The flag distinguishes a
/// plain reset pass (`reset_only = true`, no later post-hook) from a full
/// pre-measurement pass.
pub type PreHook = Box<dyn FnMut(&ArgMap, bool)>;

/// Tuner-level hook run after a measured launch, with the error when the
/// launch failed.
pub type PostHook = Box<dyn FnMut(&ArgMap, Option<&Error>)>;

/// Pre/post hook pair around measured launches.
///
/// A user-supplied hook replaces the corresponding default wholesale. The
/// defaults zero the `reset_to_zero` buffers and snapshot/restore the
/// `restore_value` buffers through a sidecar held here, so repeated
/// benchmarking of a destructive kernel leaves its inputs untouched.
pub(crate) struct Hooks {
    reset_to_zero: Vec<String>,
    restore_value: Vec<String>,
    user_pre: Option<PreHook>,
    user_post: Option<PostHook>,
    saved: HashMap<String, Box<dyn Any>>,
}

impl Hooks {
    pub(crate) fn new(
        reset_to_zero: Vec<String>,
        restore_value: Vec<String>,
        user_pre: Option<PreHook>,
        user_post: Option<PostHook>,
    ) -> Self {
        Self {
            reset_to_zero,
            restore_value,
            user_pre,
            user_post,
            saved: HashMap::new(),
        }
    }

    pub(crate) fn fire_pre(&mut self, args: &ArgMap, reset_only: bool) {
        if let Some(hook) = &mut self.user_pre {
            hook(args, reset_only);
            return;
        }
        for name in &self.reset_to_zero {
            if let Some(ArgValue::Buffer(buffer)) = args.get(name) {
                buffer.zero();
            }
        }
        if !reset_only {
            for name in &self.restore_value {
                if let Some(ArgValue::Buffer(buffer)) = args.get(name) {
                    self.saved.insert(name.clone(), buffer.snapshot());
                }
            }
        }
    }

    pub(crate) fn fire_post(&mut self, args: &ArgMap, exception: Option<&Error>) {
        if let Some(hook) = &mut self.user_post {
            hook(args, exception);
            return;
        }
        if self.restore_value.is_empty() {
            return;
        }
        for name in &self.restore_value {
            if let (Some(ArgValue::Buffer(buffer)), Some(snapshot)) =
                (args.get(name), self.saved.get(name))
            {
                buffer.restore(snapshot.as_ref());
            }
        }
        self.saved.clear();
    }
}
