use crate::{
    AppResult, AudioPlayer, PlaybackEvent, PronunciationFeedback, RecordingHistoryEntry,
    RecordingState, ScoringOutcome, SessionMachine, TopicStore,
};

use std::sync::Arc;

use recite_core::{CaptureSnapshot, EndCause, ScriptStep, ScriptedRecognizer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument, warn};

/// Console front end.
///
/// Owns the session machine and multiplexes user commands with live
/// transcript, scoring, and playback events on one loop.
pub struct App {
    pub(crate) machine: SessionMachine,
    pub(crate) store: TopicStore,
    pub(crate) current_topic: usize,
    pub(crate) snapshots: watch::Receiver<CaptureSnapshot>,
    pub(crate) scoring_rx: mpsc::UnboundedReceiver<ScoringOutcome>,
    pub(crate) playback_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
    pub(crate) player: Arc<dyn AudioPlayer>,
    pub(crate) scripted: Arc<ScriptedRecognizer>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Recite starting");

        print_welcome();
        self.print_current_topic();

        let mut input = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = input.next_line() => match line {
                    Ok(Some(line)) => match self.handle_command(line.trim()).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => println!("{}", e),
                    },
                    Ok(None) => {
                        info!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!(error = ?e, "Failed to read input");
                        break;
                    }
                },

                changed = self.snapshots.changed() => {
                    if changed.is_ok() {
                        let snapshot = self.snapshots.borrow_and_update().clone();
                        self.handle_snapshot(snapshot);
                    }
                }

                Some(outcome) = self.scoring_rx.recv() => {
                    self.handle_scoring(outcome);
                }

                Some(event) = self.playback_rx.recv() => {
                    // The take and the model reading share one player; the
                    // machine is only in Playing for the take.
                    if event == PlaybackEvent::Finished {
                        if self.machine.playback_finished() {
                            println!("Playback finished.");
                        } else {
                            println!("Model reading finished.");
                        }
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.shutdown().await;

        Ok(())
    }

    /// Dispatch one console command. Returns `false` to exit.
    async fn handle_command(&mut self, line: &str) -> AppResult<bool> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(true);
        };

        match command {
            "help" => print_help(),
            "topics" => self.print_topics(),
            "topic" => {
                let Some(index) = parts.next().and_then(|raw| raw.parse::<usize>().ok()) else {
                    println!("Usage: topic <number>");
                    return Ok(true);
                };
                if index == 0 || index > self.store.topics().len() {
                    println!("No topic {}.", index);
                    return Ok(true);
                }
                if !self.machine.reset() {
                    println!("Finish the current take before switching topics.");
                    return Ok(true);
                }
                self.current_topic = index - 1;
                self.print_current_topic();
            }
            "start" => {
                let Some(minutes) = self.arm_recognizer() else {
                    println!("No topics available.");
                    return Ok(true);
                };
                self.machine.start(minutes).await?;
                println!("Recording. Read the passage aloud; 'stop' ends the take.");
            }
            "stop" => {
                let entry = self.machine.stop().await?;
                self.bank_take(entry);
            }
            "play" => {
                self.machine.play()?;
                println!("Playing the take back.");
            }
            "stopplay" => {
                if self.machine.state() == RecordingState::Playing {
                    self.machine.stop_playing()?;
                } else {
                    self.player.stop();
                }
                println!("Playback stopped.");
            }
            "listen" => {
                if self.machine.state() != RecordingState::ReadyToRecord {
                    println!("Finish the current take before the model reading.");
                    return Ok(true);
                }
                let Some(topic) = self.store.topics().get(self.current_topic) else {
                    println!("No topics available.");
                    return Ok(true);
                };
                let Some(path) = topic.model_audio.clone() else {
                    println!("No model reading for this topic.");
                    return Ok(true);
                };
                self.player.play(&path)?;
                println!("Playing the model reading.");
            }
            "rerecord" => {
                let Some(minutes) = self.arm_recognizer() else {
                    println!("No topics available.");
                    return Ok(true);
                };
                self.machine.re_record(minutes).await?;
                println!("Recording a fresh take.");
            }
            "upload" => {
                let Some(topic) = self.store.topics().get(self.current_topic) else {
                    println!("No topics available.");
                    return Ok(true);
                };
                let passage = topic.passage.clone();
                self.machine.upload(&passage)?;
                println!("Transcript sent for scoring.");
            }
            "feedback" => match self.machine.feedback() {
                Some(feedback) => print_feedback(feedback),
                None => println!("No feedback yet. 'upload' sends the last take for scoring."),
            },
            "history" => self.print_history(),
            "timer" => {
                let timer = self.machine.timer().snapshot();
                println!(
                    "{}s elapsed, {}s remaining of {}s.",
                    timer.seconds_elapsed, timer.seconds_remaining, timer.total_seconds
                );
            }
            "state" => println!("{:?}", self.machine.state()),
            "save" => {
                self.store.save()?;
                println!("Topics saved.");
            }
            "quit" | "exit" => return Ok(false),
            other => println!("Unknown command '{}'. 'help' lists the commands.", other),
        }

        Ok(true)
    }

    /// Load the current topic's passage into the recognizer script and
    /// return the practice length.
    fn arm_recognizer(&self) -> Option<u8> {
        let topic = self.store.topics().get(self.current_topic)?;
        self.scripted.set_script(script_for(&topic.passage));
        Some(topic.length_minutes)
    }

    /// React to a capture snapshot change.
    fn handle_snapshot(&mut self, snapshot: CaptureSnapshot) {
        let Some(cause) = &snapshot.ended else {
            if !snapshot.transcript.is_empty() {
                println!("  ... {}", snapshot.transcript);
            }
            return;
        };

        match cause {
            EndCause::UserStopped => {}
            EndCause::BackendFinal => println!("Transcription complete."),
            EndCause::Error { message } => println!("Session ended: {}", message),
        }

        if let Some(entry) = self.machine.pipeline_ended() {
            self.bank_take(entry);
        }
    }

    /// Settle a scoring outcome against the machine.
    fn handle_scoring(&mut self, outcome: ScoringOutcome) {
        match outcome {
            Ok(feedback) => {
                if self.machine.complete_upload(feedback.clone()) {
                    print_feedback(&feedback);
                } else {
                    warn!("Scoring result arrived after the run moved on");
                }
            }
            Err(reason) => {
                if self.machine.scoring_failed() {
                    println!("Scoring failed: {}. The take is kept; try 'upload' again.", reason);
                } else {
                    warn!(reason = %reason, "Scoring failure arrived after the run moved on");
                }
            }
        }
    }

    /// Print the banked take, append it to the topic history, and save.
    fn bank_take(&mut self, entry: RecordingHistoryEntry) {
        match &entry.transcript {
            Some(transcript) => println!("Transcript: {}", transcript),
            None => println!("No speech was recognized."),
        }
        if let Some(topic) = self.store.topics_mut().get_mut(self.current_topic) {
            topic.record_take(entry);
            if let Err(e) = self.store.save() {
                error!(error = ?e, "Failed to save topics");
            }
        }
    }

    fn print_topics(&self) {
        for (index, topic) in self.store.topics().iter().enumerate() {
            let marker = if index == self.current_topic { '*' } else { ' ' };
            println!(
                "{} {}. {} ({} min, {} takes)",
                marker,
                index + 1,
                topic.title,
                topic.length_minutes,
                topic.history.len()
            );
        }
    }

    fn print_current_topic(&self) {
        let Some(topic) = self.store.topics().get(self.current_topic) else {
            println!("No topics available.");
            return;
        };
        println!("Topic: {} ({} minutes)", topic.title, topic.length_minutes);
        println!();
        println!("{}", topic.passage);
        println!();
    }

    fn print_history(&self) {
        let Some(topic) = self.store.topics().get(self.current_topic) else {
            println!("No topics available.");
            return;
        };
        if topic.history.is_empty() {
            println!("No takes recorded for '{}' yet.", topic.title);
            return;
        }
        for entry in &topic.history {
            let when = entry.recorded_at.format("%Y-%m-%d %H:%M");
            match &entry.transcript {
                Some(transcript) => println!("  {}  {}", when, transcript),
                None => println!("  {}  (no speech recognized)", when),
            }
        }
    }

    /// Stop whatever is still running and save before exiting.
    async fn shutdown(&mut self) {
        if self.machine.state() == RecordingState::Recording {
            match self.machine.stop().await {
                Ok(entry) => self.bank_take(entry),
                Err(e) => error!(error = ?e, "Failed to stop recording during shutdown"),
            }
        }
        if self.machine.state() == RecordingState::Playing {
            if let Err(e) = self.machine.stop_playing() {
                error!(error = ?e, "Failed to stop playback during shutdown");
            }
        }
        self.player.stop();
        if let Err(e) = self.store.save() {
            error!(error = ?e, "Failed to save topics during shutdown");
        }
        info!("Recite shut down successfully");
    }
}

fn print_welcome() {
    println!("Recite: read a passage aloud and get pronunciation feedback.");
    println!("Type 'help' for commands.");
    println!();
}

fn print_help() {
    println!("Commands:");
    println!("  topics            list topics");
    println!("  topic <number>    switch topic");
    println!("  start             record a take of the current topic");
    println!("  stop              stop the take");
    println!("  play              play the banked take back");
    println!("  stopplay          stop playback");
    println!("  listen            play the topic's model reading");
    println!("  rerecord          discard the take and record again");
    println!("  upload            send the transcript for scoring");
    println!("  feedback          show the scoring feedback");
    println!("  history           list takes for the current topic");
    println!("  timer             show the practice clock");
    println!("  state             show the session state");
    println!("  save              save topics to disk");
    println!("  quit              save and exit");
}

fn print_feedback(feedback: &PronunciationFeedback) {
    println!("Average score: {:.2}", feedback.average_score);
    for fragment in &feedback.fragments {
        println!(
            "  {:.2}  {}  (heard: {})",
            fragment.score, fragment.original, fragment.recognized
        );
    }
}

/// Script the recognizer to replay `passage` as growing partial
/// transcripts followed by one final result.
fn script_for(passage: &str) -> Vec<ScriptStep> {
    let words: Vec<&str> = passage.split_whitespace().collect();
    if words.is_empty() {
        return vec![ScriptStep::Final(String::new())];
    }
    let mut steps = Vec::with_capacity(words.len());
    for end in 1..words.len() {
        steps.push(ScriptStep::Partial(words[..end].join(" ")));
    }
    steps.push(ScriptStep::Final(words.join(" ")));
    steps
}
