#![allow(unused_macros)]

use std::{
    any::type_name,
    fmt::Debug,
    future::{ready, Future},
    marker::PhantomData,
    ops::{Deref, DerefMut},
};
pub use async_trait::async_trait;

/// `wepx_action` provides a small "action" abstraction: a trait with a single
/// `async fn execute(&self, data)` method whose instances are assembled at the call site (where
/// all concrete types are known) and then injected into generic owners as configurable behavior.
/// This is how the run orchestrator and tail-streaming server let their callers decide what
/// happens on a downloaded file or on a newly emitted frame, without the orchestrator/server
/// needing to know anything about printing, metrics, or test assertions.
///
/// Two flavors are provided:
/// - [`DataAction<T>`] + [`data_action!`] for a single, statically-typed action
/// - [`DynDataAction<T>`] + [`dyn_data_action!`] for action objects that must be stored in a
///   homogenous container (e.g. the list of clients subscribed to a tail-streaming server)

/// wrapper error type for actions, convertible from anything implementing `ToString` so action
/// bodies can freely use `?` on their own fallible operations.
pub struct WepxActionError {
    pub msg: String,
    pub src: String,
}

impl WepxActionError {
    pub fn from<E>(e: E) -> Self
    where
        E: ToString,
    {
        WepxActionError { msg: e.to_string(), src: std::any::type_name::<E>().to_string() }
    }
}

impl std::fmt::Debug for WepxActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WepxActionError({}): {}", self.src, self.msg)
    }
}

impl std::fmt::Display for WepxActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "action failed: {}", self.msg)
    }
}

impl std::error::Error for WepxActionError {}

#[inline]
pub fn map_action_err<T, E>(r: std::result::Result<T, E>) -> std::result::Result<T, WepxActionError>
where
    E: ToString,
{
    r.map_err(|e| WepxActionError { msg: e.to_string(), src: type_name::<E>().to_string() })
}

/* #region DataAction ************************************************************************/

/// a single-argument async action, parameterized over the data it is invoked with.
pub trait DataAction<T>: Debug + Send {
    fn execute(&self, data: T) -> impl Future<Output = std::result::Result<(), WepxActionError>> + Send;
}

/// define and instantiate an ad hoc [`DataAction<T>`] that clone-captures local variables.
#[macro_export]
macro_rules! data_action {
    ( $( $v:ident $(. $op:ident ())? : $v_type:ty ),* => |$data:ident : $data_type:ty| $e:expr ) => {
        {
            struct SomeDataAction { $( $v: $v_type ),* }

            impl $crate::DataAction<$data_type> for SomeDataAction {
                async fn execute (&self, $data : $data_type) -> std::result::Result<(),$crate::WepxActionError> {
                    $( let $v = &self. $v;)*
                    $crate::map_action_err($e)
                }
            }
            impl std::fmt::Debug for SomeDataAction {
                fn fmt (&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "DataAction<{}>", stringify!($data_type))
                }
            }

            SomeDataAction{ $( $v: $v $(. $op () )? ),* }
        }
    }
}

/// a [`DataAction<T>`] that does nothing. Use in place of `Option<impl DataAction<T>>`.
pub struct NoDataAction<T>
where
    T: Send,
{
    _phantom: PhantomData<T>,
}
impl<T> NoDataAction<T>
where
    T: Send,
{
    pub fn new() -> Self {
        NoDataAction { _phantom: PhantomData }
    }
}
impl<T> DataAction<T> for NoDataAction<T>
where
    T: Send,
{
    fn execute(&self, _data: T) -> impl Future<Output = std::result::Result<(), WepxActionError>> + Send {
        ready(Ok(()))
    }
}
impl<T> Debug for NoDataAction<T>
where
    T: Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NoDataAction<{}>", type_name::<T>())
    }
}

/* #endregion DataAction */

/* #region DynDataAction *********************************************************************/

/// sendable [`DataAction<T>`] that can be stored in a homogenous container (as a trait object).
/// This has per-execution runtime cost (pin-boxed future) but lets the tail-streaming server keep
/// a `Vec` of heterogeneous client subscriptions.
#[async_trait]
pub trait DynDataActionTrait<T>: Debug + Send + Sync {
    async fn execute(&self, data: T) -> std::result::Result<(), WepxActionError>;
}

pub type DynDataAction<T> = Box<dyn DynDataActionTrait<T>>;

#[macro_export]
macro_rules! dyn_data_action {
    ( $( $v:ident $(. $op:ident ())? : $v_type:ty ),* => |$data:ident : $data_type:ty| $e:expr ) => {
        {
            use $crate::async_trait;

            struct SomeDynDataAction { $( $v: $v_type ),* }

            #[async_trait]
            impl $crate::DynDataActionTrait<$data_type> for SomeDynDataAction {
                async fn execute (&self, $data : $data_type) -> std::result::Result<(),$crate::WepxActionError> {
                    $( let $v = &self. $v;)*
                    $crate::map_action_err($e)
                }
            }
            impl std::fmt::Debug for SomeDynDataAction {
                fn fmt (&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "DynDataAction<{}>", stringify!($data_type))
                }
            }

            Box::new(SomeDynDataAction{ $( $v: $v $(. $op () )? ),* })
        }
    }
}

/// container of subscribed [`DynDataAction<T>`]s, executed in registration order. Failures from
/// individual subscribers do not stop delivery to the rest (`execute_infallible`), matching the
/// tail-streaming server's requirement that one slow/broken client must not affect others.
pub struct DynDataActionList<T>
where
    T: Clone,
{
    entries: Vec<DynDataAction<T>>,
}

impl<T> DynDataActionList<T>
where
    T: Clone,
{
    pub fn new() -> Self {
        DynDataActionList { entries: Vec::new() }
    }

    pub async fn execute_infallible(&self, data: T) {
        for e in &self.entries {
            let _ = e.execute(data.clone()).await;
        }
    }
}

impl<T> Deref for DynDataActionList<T>
where
    T: Clone,
{
    type Target = Vec<DynDataAction<T>>;
    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl<T> DerefMut for DynDataActionList<T>
where
    T: Clone,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entries
    }
}

/* #endregion DynDataAction */

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn no_data_action_is_a_noop() {
        let action = NoDataAction::<u32>::new();
        assert!(action.execute(7).await.is_ok());
    }

    #[tokio::test]
    async fn data_action_macro_captures_and_runs() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let action = data_action!(seen.clone(): Arc<Mutex<Vec<u32>>> => |data: u32| {
            seen.lock().unwrap().push(data);
            Ok::<(), String>(())
        });

        action.execute(1).await.unwrap();
        action.execute(2).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn dyn_data_action_list_runs_every_subscriber_even_if_one_fails() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

        let ok_action = dyn_data_action!(seen.clone(): Arc<Mutex<Vec<u32>>> => |data: u32| {
            seen.lock().unwrap().push(data);
            Ok::<(), String>(())
        });
        let marker = ();
        let failing_action = dyn_data_action!(marker: () => |_data: u32| {
            Err::<(), String>("boom".to_string())
        });

        let mut list: DynDataActionList<u32> = DynDataActionList::new();
        list.push(ok_action);
        list.push(failing_action);

        list.execute_infallible(5).await;
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }
}
