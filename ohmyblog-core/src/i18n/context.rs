//! Current request locale.
//!
//! The value lives in a tokio task-local, so it is visible to everything
//! awaited inside [`with_locale`] and to nothing else. Leaving the scope, by
//! completion, error or panic, restores whatever was installed before.
//! Spawned tasks do not inherit it; pass the locale explicitly instead.

use std::future::Future;

tokio::task_local! {
    static CURRENT_LOCALE: String;
}

/// Run `future` with `locale` as the current locale.
pub async fn with_locale<F>(locale: impl Into<String>, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_LOCALE.scope(locale.into(), future).await
}

/// Run the closure `f` with `locale` as the current locale.
pub fn sync_with_locale<R>(locale: impl Into<String>, f: impl FnOnce() -> R) -> R {
    CURRENT_LOCALE.sync_scope(locale.into(), f)
}

/// The locale installed by the innermost enclosing scope, if any.
pub fn current_locale() -> Option<String> {
    CURRENT_LOCALE.try_with(Clone::clone).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unset_outside_scope() {
        assert_eq!(current_locale(), None);
    }

    #[tokio::test]
    async fn nested_scope_restores_outer_value() {
        with_locale("zh_CN", async {
            assert_eq!(current_locale().as_deref(), Some("zh_CN"));

            let inner: Result<(), &str> = with_locale("en_US", async {
                assert_eq!(current_locale().as_deref(), Some("en_US"));
                Err("handler failed")
            })
            .await;

            assert!(inner.is_err());
            assert_eq!(current_locale().as_deref(), Some("zh_CN"));
        })
        .await;

        assert_eq!(current_locale(), None);
    }

    #[test]
    fn panic_inside_scope_restores_outer_value() {
        sync_with_locale("zh_CN", || {
            let caught = std::panic::catch_unwind(|| {
                sync_with_locale("en_US", || panic!("handler panicked"));
            });
            assert!(caught.is_err());
            assert_eq!(current_locale().as_deref(), Some("zh_CN"));
        });
        assert_eq!(current_locale(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_scopes_are_isolated() {
        let tasks: Vec<_> = ["zh_CN", "en_US", "ja_JP", "fr_FR"]
            .into_iter()
            .map(|locale| {
                tokio::spawn(with_locale(locale, async move {
                    for i in 0..20 {
                        if i % 3 == 0 {
                            tokio::time::sleep(Duration::from_millis(1)).await;
                        } else {
                            tokio::task::yield_now().await;
                        }
                        assert_eq!(current_locale().as_deref(), Some(locale));
                    }
                    locale
                }))
            })
            .collect();

        for task in tasks {
            let locale = task.await.expect("task panicked");
            assert!(!locale.is_empty());
        }
    }

    #[tokio::test]
    async fn spawned_task_does_not_inherit() {
        let seen = with_locale("en_US", async {
            tokio::spawn(async { current_locale() }).await.unwrap()
        })
        .await;
        assert_eq!(seen, None);
    }
}
