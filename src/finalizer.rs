use std::fmt;

type Callback = Box<dyn FnOnce(i32) + Send>;

/// Named shutdown callback
pub struct Finalizer {
    name: String,
    callback: Callback,
}

impl Finalizer {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the callback with the final exit code
    pub fn call(self, code: i32) {
        (self.callback)(code)
    }
}

impl fmt::Debug for Finalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finalizer").field("name", &self.name).finish()
    }
}

/// Insertion-ordered list of finalizers with unique names
#[derive(Debug, Default)]
pub struct FinalizerChain {
    entries: Vec<Finalizer>,
}

impl FinalizerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finalizer, replacing any entry with the same name
    ///
    /// `param` is moved into the callback and handed back to it at shutdown.
    pub fn add<P, F>(&mut self, name: &str, param: P, f: F)
    where
        P: Send + 'static,
        F: FnOnce(i32, P) + Send + 'static,
    {
        self.remove(name);
        self.entries.push(Finalizer {
            name: name.to_string(),
            callback: Box::new(move |code| f(code, param)),
        });
    }

    /// Removes the named finalizer. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Empties the chain, yielding finalizers most recently added first
    pub fn drain_lifo(&mut self) -> impl Iterator<Item = Finalizer> {
        std::mem::take(&mut self.entries).into_iter().rev()
    }
}
