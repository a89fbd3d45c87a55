use std::{
    sync::{atomic::{AtomicBool, Ordering}, Arc, Mutex},
    time::Duration,
};
use futures::{
    future::BoxFuture,
    task::{waker_ref, ArcWake, Context, Poll},
    Future
};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
mod threadpool;

type BoxedTask = BoxFuture<'static, ()>;

// How long an idle executor waits before re-checking the termination flag.
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// A spawned future plus the queue it re-enters when woken.
struct Task {
    future: Mutex<Option<BoxedTask>>,
    queue: Sender<Arc<Task>>,
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let _ = arc_self.queue.send(arc_self.clone());
    }
}

pub struct Executor {
    global_queue: Receiver<Arc<Task>>,
    termination_flag: Arc<AtomicBool>,
}

impl Executor {
    fn new(global_queue: Receiver<Arc<Task>>, termination_flag: Arc<AtomicBool>) -> Self {
        Executor {
            global_queue,
            termination_flag,
        }
    }

    fn run(&self) {
        while !self.termination_flag.load(Ordering::Acquire) {
            let task = match self.global_queue.recv_timeout(IDLE_WAIT) {
                Ok(task) => task,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            // a task woken while another executor polls it waits here
            let mut slot = task.future.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(mut future) = slot.take() {
                let waker = waker_ref(&task);
                let mut context = Context::from_waker(&waker);

                match future.as_mut().poll(&mut context) {
                    Poll::Ready(()) => logger::trace!("Async task finished"),
                    Poll::Pending => *slot = Some(future),
                }
            }
        }
    }
}

/// Fixed pool of executor threads sharing one task queue.
pub struct ConcurrentRuntime {
    sender: Sender<Arc<Task>>,
    receiver: Receiver<Arc<Task>>,
    termination_flag: Arc<AtomicBool>,
    threadpool: threadpool::ThreadPool,
    started: bool,
}

impl ConcurrentRuntime {
    pub fn new(num_threads: usize) -> Self {
        let (sender, receiver) = unbounded();
        let threadpool = threadpool::ThreadPool::new(num_threads);

        Self {
            sender,
            receiver,
            termination_flag: Arc::new(AtomicBool::new(false)),
            threadpool,
            started: false,
        }
    }

    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        for _ in 0..self.threadpool.workers_count() {
            let executor = Executor::new(self.receiver.clone(), self.termination_flag.clone());
            self.threadpool.execute(move || executor.run());
        }
        logger::debug!("Runtime started with {} executors", self.threadpool.workers_count());
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static
    {
        let task = Arc::new(Task {
            future: Mutex::new(Some(Box::pin(future))),
            queue: self.sender.clone(),
        });

        if self.sender.send(task).is_err() {
            logger::error!("Runtime queue closed, task dropped");
        }
    }

    pub fn executors_count(&self) -> usize {
        self.threadpool.workers_count()
    }

    pub fn stop(&mut self) {
        self.termination_flag.store(true, Ordering::Release);
    }
}

impl Drop for ConcurrentRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::ConcurrentRuntime;
    use crossbeam::channel::bounded;
    use std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
        time::Duration,
    };

    // Pending on the first poll, waking itself before returning.
    struct YieldOnce {
        yielded: bool,
    }

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.yielded {
                Poll::Ready(())
            } else {
                self.yielded = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    #[test]
    fn test_spawned_tasks_complete() {
        let mut runtime = ConcurrentRuntime::new(2);
        runtime.start();

        let (sender, receiver) = bounded(8);
        for i in 0..8 {
            let sender = sender.clone();
            runtime.spawn(async move {
                let _ = sender.send(i);
            });
        }

        let mut results: Vec<i32> = (0..8)
            .map(|_| receiver.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        results.sort();
        assert_eq!(results, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_woken_task_is_polled_again() {
        let mut runtime = ConcurrentRuntime::new(1);
        runtime.start();

        let (sender, receiver) = bounded(1);
        runtime.spawn(async move {
            YieldOnce { yielded: false }.await;
            let _ = sender.send("done");
        });

        assert_eq!(receiver.recv_timeout(Duration::from_secs(5)), Ok("done"));
    }

    #[test]
    fn test_tasks_wait_for_start() {
        let mut runtime = ConcurrentRuntime::new(1);
        let (sender, receiver) = bounded(1);
        runtime.spawn(async move {
            let _ = sender.send(1);
        });

        assert!(receiver.recv_timeout(Duration::from_millis(100)).is_err());
        runtime.start();
        assert_eq!(receiver.recv_timeout(Duration::from_secs(5)), Ok(1));
    }

    #[test]
    fn test_stop_joins_executors() {
        let mut runtime = ConcurrentRuntime::new(2);
        runtime.start();
        assert_eq!(runtime.executors_count(), 2);
        // dropping must not hang
        drop(runtime);
    }
}
