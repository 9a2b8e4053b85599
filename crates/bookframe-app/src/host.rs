//! Host page side effects.
//!
//! While the overlay is open the host page must not scroll underneath it, and
//! mobile browsers must not zoom when a form input takes focus. Both changes
//! are shared page state and have to be undone on every exit path, so they
//! are held by an RAII [`HostGuard`] rather than by paired calls.

use std::ops::{Deref, DerefMut};

/// Mutable host page state touched by a session.
pub trait HostPage {
    /// Current viewport meta content. `None` if the page has no viewport
    /// meta tag.
    fn viewport_meta(&self) -> Option<String>;

    /// Replace the viewport meta content.
    fn set_viewport_meta(&mut self, content: &str);

    /// Lock or unlock body scrolling.
    fn set_scroll_locked(&mut self, locked: bool);
}

/// Holds the host page modified for the lifetime of a session.
///
/// Restores the prior viewport meta and unlocks scrolling when released or
/// dropped, whichever comes first. Dropping covers early returns, driver
/// errors, and unwinding.
pub struct HostGuard<H: HostPage> {
    host: Option<H>,
    prior_viewport: Option<String>,
}

impl<H: HostPage> HostGuard<H> {
    /// Lock scrolling and pin the viewport meta to `locked_viewport`.
    ///
    /// A page without a viewport meta tag is left without one.
    pub fn acquire(mut host: H, locked_viewport: &str) -> Self {
        let prior_viewport = host.viewport_meta();
        host.set_scroll_locked(true);
        if prior_viewport.is_some() {
            host.set_viewport_meta(locked_viewport);
        }
        tracing::debug!(had_viewport_meta = prior_viewport.is_some(), "host page locked");
        Self { host: Some(host), prior_viewport }
    }

    /// Restore the host page and hand it back.
    pub fn release(mut self) -> H {
        self.restore();
        #[allow(clippy::expect_used)]
        self.host.take().expect("invariant: host is present until the guard is released")
    }

    fn restore(&mut self) {
        let Some(host) = self.host.as_mut() else {
            return;
        };
        if let Some(prior) = self.prior_viewport.take() {
            host.set_viewport_meta(&prior);
        }
        host.set_scroll_locked(false);
        tracing::debug!("host page restored");
    }
}

impl<H: HostPage> Deref for HostGuard<H> {
    type Target = H;

    #[allow(clippy::expect_used)]
    fn deref(&self) -> &H {
        self.host.as_ref().expect("invariant: host is present until the guard is released")
    }
}

impl<H: HostPage> DerefMut for HostGuard<H> {
    #[allow(clippy::expect_used)]
    fn deref_mut(&mut self) -> &mut H {
        self.host.as_mut().expect("invariant: host is present until the guard is released")
    }
}

impl<H: HostPage> Drop for HostGuard<H> {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Page {
        meta: Option<String>,
        scroll_locked: bool,
        writes: usize,
    }

    impl HostPage for Page {
        fn viewport_meta(&self) -> Option<String> {
            self.meta.clone()
        }

        fn set_viewport_meta(&mut self, content: &str) {
            self.meta = Some(content.to_string());
            self.writes += 1;
        }

        fn set_scroll_locked(&mut self, locked: bool) {
            self.scroll_locked = locked;
        }
    }

    const LOCKED: &str = "width=device-width, user-scalable=no";

    #[test]
    fn release_restores_prior_state() {
        let page = Page { meta: Some("width=device-width".into()), ..Page::default() };

        let guard = HostGuard::acquire(page, LOCKED);
        assert!(guard.scroll_locked);
        assert_eq!(guard.meta.as_deref(), Some(LOCKED));

        let page = guard.release();
        assert!(!page.scroll_locked);
        assert_eq!(page.meta.as_deref(), Some("width=device-width"));
    }

    #[test]
    fn page_without_meta_stays_without_meta() {
        let page = HostGuard::acquire(Page::default(), LOCKED).release();

        assert_eq!(page.meta, None);
        assert_eq!(page.writes, 0);
    }

    #[test]
    fn unwinding_restores_host() {
        use std::{
            panic::{AssertUnwindSafe, catch_unwind},
            sync::{Arc, Mutex},
        };

        struct Shared(Arc<Mutex<Page>>);

        impl HostPage for Shared {
            fn viewport_meta(&self) -> Option<String> {
                self.0.lock().ok().and_then(|p| p.meta.clone())
            }

            fn set_viewport_meta(&mut self, content: &str) {
                if let Ok(mut page) = self.0.lock() {
                    page.set_viewport_meta(content);
                }
            }

            fn set_scroll_locked(&mut self, locked: bool) {
                if let Ok(mut page) = self.0.lock() {
                    page.scroll_locked = locked;
                }
            }
        }

        let page = Arc::new(Mutex::new(Page { meta: Some("initial".into()), ..Page::default() }));
        let shared = Shared(Arc::clone(&page));

        let result = catch_unwind(AssertUnwindSafe(move || {
            let _guard = HostGuard::acquire(shared, LOCKED);
            #[allow(clippy::panic)]
            {
                panic!("driver blew up");
            }
        }));
        assert!(result.is_err());

        let Ok(page) = page.lock() else {
            unreachable!("page lock is never poisoned by the guard");
        };
        assert!(!page.scroll_locked);
        assert_eq!(page.meta.as_deref(), Some("initial"));
    }
}
