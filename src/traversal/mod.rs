//! The traversal engine.
//!
//! A [`Session`] owns everything one operator needs: the image index, both
//! stores, the operator identity and the traversal state. It is the only
//! mutable state in the workflow, so one session per operator is all the
//! coordination there is.
//!
//! # Transitions
//!
//! - **Display** shows whatever index is current, resolved or not. Past the
//!   end of the list it yields [`View::OutOfImages`].
//! - **Submit** attaches the plate text, credits the operator, and moves to
//!   the first unresolved image after the current one (the skip-scan).
//! - **Flag** is Submit with `<flagged>true</flagged>` instead of a plate
//!   text. It is credited on the ledger too.
//! - **Back** pops the history and shows that image again without checking
//!   whether it has since been resolved, so it can be corrected.
//!
//! A new session starts at index 0 without filtering, unless `resume` is set,
//! in which case it starts at the first unresolved image.
//!
//! Store writes are not transactional. If the ledger write fails after the
//! record was rewritten, the record change stays. The position only moves
//! once every write and the skip-scan have succeeded.

mod action;
mod state;
mod view;

pub use action::Action;
pub use state::TraversalState;
pub use view::{Frame, View, OUT_OF_IMAGES_MESSAGE};

use log::{debug, info};

use crate::config::Config;
use crate::error::LabelError;
use crate::index::{record_id_for, ImageIndex};
use crate::ledger::Ledger;
use crate::progress::progress_report;
use crate::record::RecordStore;
use crate::session::SessionContext;

/// One operator's labeling session.
#[derive(Debug)]
pub struct Session {
    index: ImageIndex,
    records: RecordStore,
    ledger: Ledger,
    context: SessionContext,
    state: TraversalState,
    create_missing_records: bool,
}

impl Session {
    /// Opens a session over the workspace described by `config`.
    pub fn open(config: &Config) -> Result<Self, LabelError> {
        let mut session = Self::new(
            ImageIndex::new(&config.images_dir, &config.image_extension),
            RecordStore::new(&config.records_dir),
            Ledger::new(&config.ledger_path),
        );
        session.create_missing_records = config.create_missing_records;

        if config.resume {
            let images = session.images()?;
            let start = session.skip_scan(&images, 0)?;
            session.state = TraversalState::starting_at(start);
            info!("resuming at image {start} of {}", images.len());
        }
        Ok(session)
    }

    /// A session at index 0 with nobody logged in.
    pub fn new(index: ImageIndex, records: RecordStore, ledger: Ledger) -> Self {
        Self {
            index,
            records,
            ledger,
            context: SessionContext::new(),
            state: TraversalState::new(),
            create_missing_records: false,
        }
    }

    pub fn login(&mut self, user_name: &str) -> Result<(), LabelError> {
        self.context.login(user_name)?;
        info!("operator {user_name} logged in");
        Ok(())
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn state(&self) -> &TraversalState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn index(&self) -> &ImageIndex {
        &self.index
    }

    /// Runs one action and displays the resulting position.
    pub fn apply(&mut self, action: Action) -> Result<View, LabelError> {
        match action {
            Action::Load => {}
            Action::Submit(plate_text) => {
                self.submit(&plate_text)?;
            }
            Action::Flag => {
                self.flag()?;
            }
            Action::Back => {
                self.back();
            }
        }
        self.display()
    }

    /// Attaches `plate_text` to the current image's record, credits the
    /// operator, and skip-scans forward. Returns the new index.
    pub fn submit(&mut self, plate_text: &str) -> Result<usize, LabelError> {
        self.commit(|records, record_id| {
            records.attach_plate_text(record_id, plate_text)?;
            Ok(())
        })
    }

    /// Flags the current image, credits the operator, and skip-scans
    /// forward. Returns the new index.
    pub fn flag(&mut self) -> Result<usize, LabelError> {
        self.commit(|records, record_id| records.set_flagged(record_id))
    }

    /// Returns to the most recently committed index. A no-op with an empty
    /// history. Returns the index now current.
    pub fn back(&mut self) -> usize {
        match self.state.undo() {
            Some(index) => info!("back to image {index}"),
            None => debug!("back with empty history; staying at {}", self.current_index()),
        }
        self.current_index()
    }

    /// Builds the view for the current index without changing state.
    pub fn display(&self) -> Result<View, LabelError> {
        let images = self.images()?;
        let index = self.current_index();
        let Some(image_name) = images.get(index) else {
            return Ok(View::OutOfImages);
        };

        let record = self.records.load_for_image(image_name)?;
        let progress = progress_report(&self.records, &self.ledger)?;

        Ok(View::Image(Box::new(Frame {
            index,
            image_count: images.len(),
            image_name: image_name.clone(),
            image_path: self.index.image_path(image_name),
            record,
            progress,
        })))
    }

    /// Smallest index `j >= start` whose image is neither annotated nor
    /// flagged, or `images.len()` if there is none.
    pub fn skip_scan(&self, images: &[String], start: usize) -> Result<usize, LabelError> {
        for (offset, image) in images.iter().enumerate().skip(start) {
            if !self.records.is_resolved(&record_id_for(image))? {
                return Ok(offset);
            }
        }
        Ok(images.len())
    }

    fn commit<F>(&mut self, write: F) -> Result<usize, LabelError>
    where
        F: FnOnce(&RecordStore, &str) -> Result<(), LabelError>,
    {
        let user_name = self.context.require_user()?.to_string();
        let images = self.images()?;
        let current = self.current_index();
        let image = images
            .get(current)
            .ok_or(LabelError::ImageIndexOutOfRange {
                index: current,
                len: images.len(),
            })?;

        write(&self.records, &record_id_for(image))?;
        self.ledger.increment(&user_name)?;

        let next = self.skip_scan(&images, current + 1)?;
        self.state.advance(next);
        info!("{user_name} committed {image}; moving to image {next}");
        Ok(next)
    }

    fn images(&self) -> Result<Vec<String>, LabelError> {
        if self.create_missing_records {
            self.records.create_missing(&self.index)?;
        }
        self.index.list()
    }
}
