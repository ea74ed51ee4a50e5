//! Consent screen and the demographic questionnaire shown before the trials.

use chrono::{DateTime, Utc};
use fitts_core::view::{BLACK, WHITE};
use fitts_core::{
    Bounds, FrameView, Handedness, MouseUsage, ParticipantId, Point, ScreeningRecord, Shape,
};

const HEADING_PX: f32 = 28.0;
const BODY_PX: f32 = 18.0;
const LINE_SPACING: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreeningControl {
    Handedness(Handedness),
    Usage(MouseUsage),
    Finish,
}

/// Button placement for a given screen size
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningLayout {
    pub agree: Bounds,
    pub left_hand: Bounds,
    pub right_hand: Bounds,
    pub usage: [Bounds; 3],
    pub finish: Bounds,
    width: f64,
    height: f64,
}

impl ScreeningLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            agree: Bounds::new(width / 2.0 - 75.0, height - 75.0, 150.0, 50.0),
            left_hand: Bounds::new(50.0, 120.0, 120.0, 40.0),
            right_hand: Bounds::new(200.0, 120.0, 120.0, 40.0),
            usage: [
                Bounds::new(50.0, 250.0, 180.0, 40.0),
                Bounds::new(250.0, 250.0, 180.0, 40.0),
                Bounds::new(450.0, 250.0, 180.0, 40.0),
            ],
            finish: Bounds::new(width / 2.0 - 200.0, 400.0, 400.0, 50.0),
            width,
            height,
        }
    }

    pub fn hit_agree(&self, p: Point) -> bool {
        self.agree.contains(p)
    }

    pub fn hit_questionnaire(&self, p: Point) -> Option<ScreeningControl> {
        if self.left_hand.contains(p) {
            return Some(ScreeningControl::Handedness(Handedness::Left));
        }
        if self.right_hand.contains(p) {
            return Some(ScreeningControl::Handedness(Handedness::Right));
        }
        if let Some(i) = self.usage.iter().position(|b| b.contains(p)) {
            return Some(ScreeningControl::Usage(MouseUsage::ALL[i]));
        }
        if self.finish.contains(p) {
            return Some(ScreeningControl::Finish);
        }
        None
    }

    pub fn consent_view(&self, trials: usize) -> FrameView {
        let mut view = FrameView::with_background(WHITE);
        view.text(
            "Greetings, welcome to the Fitts' Law experiment!",
            Point::new(20.0, 20.0),
            HEADING_PX,
            BLACK,
        );
        view.text(
            "Experiment Directions:",
            Point::new(20.0, 80.0),
            BODY_PX,
            BLACK,
        );
        let directions = format!(
            "In this experiment, you will be tasked with moving the cursor with a mouse to\n\
             click the circles that vary by size and distance from the center of the screen.\n\
             Before each circle, click the square located in the center of the screen\n\
             to make the circle appear. This continues until all {trials} circles are clicked.\n\
             You may quit the experiment at any time by closing the window or pressing Escape."
        );
        push_lines(&mut view, &directions, Point::new(20.0, 120.0));
        view.text(
            "Consent of Participation:",
            Point::new(20.0, 350.0),
            BODY_PX,
            BLACK,
        );
        push_lines(
            &mut view,
            "By clicking the 'I Agree' button below, you consent to the\n\
             collection of data that is produced from your participation in the\n\
             experiment. This study is anonymous, your name will not be collected.\n\
             The data will be used for non-commercial and academic purposes only.",
            Point::new(20.0, 390.0),
        );
        view.push(Shape::Button {
            bounds: self.agree,
            label: "I Agree".to_string(),
            selected: false,
        });
        view
    }

    pub fn consent_recorded_view(&self) -> FrameView {
        let mut view = FrameView::with_background(WHITE);
        view.centered_text(
            "Your consent has been recorded! Thank you for your participation!",
            Point::new(self.width / 2.0, self.height / 2.0 - 50.0),
            HEADING_PX,
            BLACK,
        );
        view
    }

    pub fn questionnaire_view(&self, form: &ScreeningForm) -> FrameView {
        let mut view = FrameView::with_background(WHITE);
        view.text(
            "Are you left or right handed?",
            Point::new(50.0, 50.0),
            HEADING_PX,
            BLACK,
        );
        view.text(
            "How many hours per week do you use a mouse?",
            Point::new(50.0, 200.0),
            HEADING_PX,
            BLACK,
        );
        for (bounds, hand, label) in [
            (self.left_hand, Handedness::Left, "Left"),
            (self.right_hand, Handedness::Right, "Right"),
        ] {
            view.push(Shape::Button {
                bounds,
                label: label.to_string(),
                selected: form.handedness == Some(hand),
            });
        }
        for (bounds, usage) in self.usage.iter().zip(MouseUsage::ALL) {
            view.push(Shape::Button {
                bounds: *bounds,
                label: usage.label().to_string(),
                selected: form.mouse_usage == Some(usage),
            });
        }
        view.push(Shape::Button {
            bounds: self.finish,
            label: "Finish and Go to Experiment".to_string(),
            selected: false,
        });
        view
    }
}

fn push_lines(view: &mut FrameView, text: &str, origin: Point) {
    let step = BODY_PX as f64 * LINE_SPACING;
    for (i, line) in text.lines().enumerate() {
        view.text(
            line.trim(),
            Point::new(origin.x, origin.y + i as f64 * step),
            BODY_PX,
            BLACK,
        );
    }
}

/// Answers given so far. Either answer may be changed until the form is finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreeningForm {
    pub handedness: Option<Handedness>,
    pub mouse_usage: Option<MouseUsage>,
}

impl ScreeningForm {
    pub fn select(&mut self, control: ScreeningControl) {
        match control {
            ScreeningControl::Handedness(h) => self.handedness = Some(h),
            ScreeningControl::Usage(u) => self.mouse_usage = Some(u),
            ScreeningControl::Finish => {}
        }
    }

    pub fn is_complete(&self) -> bool {
        self.handedness.is_some() && self.mouse_usage.is_some()
    }

    /// The record to persist, or `None` while an answer is still missing
    pub fn finish(&self, participant_id: ParticipantId, at: DateTime<Utc>) -> Option<ScreeningRecord> {
        Some(ScreeningRecord {
            participant_id,
            handedness: self.handedness?,
            mouse_usage: self.mouse_usage?,
            timestamp: at,
        })
    }
}
