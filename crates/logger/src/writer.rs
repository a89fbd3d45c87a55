use std::{
    sync::{atomic::{AtomicUsize, Ordering}, Arc},
    thread::{self, JoinHandle},
};

use crossbeam_channel::Receiver;

use crate::{logger::{LogCommand, SharedTarget}, msg_fmt::LogMessage};

pub(crate) fn start_writer_thread(receiver: Receiver<LogCommand>,
                                  target: SharedTarget,
                                  capacity: Arc<AtomicUsize>
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut cache: Vec<LogMessage> = Vec::new();

        for command in receiver.iter() {
            match command {
                LogCommand::Message(message) => {
                    cache.push(message);
                    if cache.len() >= capacity.load(Ordering::Acquire) {
                        write_cached(&target, &mut cache);
                    }
                }
                LogCommand::Flush(ack) => {
                    write_cached(&target, &mut cache);
                    let _ = ack.send(());
                }
                LogCommand::Terminate => break,
            }
        }

        write_cached(&target, &mut cache);
    })
}

fn write_cached(target: &SharedTarget, cache: &mut Vec<LogMessage>) {
    if cache.is_empty() {
        return;
    }

    let target = target.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    for message in cache.drain(..) {
        target.log(&message);
    }
}
