//! State change listeners shared by the session and sync layers.

use std::cell::RefCell;
use std::rc::Rc;

pub(crate) struct Listeners<T> {
    callbacks: RefCell<Vec<Rc<dyn Fn(&T)>>>,
}

impl<T> Listeners<T> {
    pub(crate) fn new() -> Self {
        Self {
            callbacks: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, callback: impl Fn(&T) + 'static) {
        self.callbacks.borrow_mut().push(Rc::new(callback));
    }

    /// Callbacks may register further listeners; those see the next emit
    pub(crate) fn emit(&self, value: &T) {
        let callbacks = self.callbacks.borrow().clone();
        for callback in callbacks {
            callback(value);
        }
    }
}
