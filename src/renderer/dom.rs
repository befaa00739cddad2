//! DOM presenter (WASM only)
//!
//! Cups are absolutely positioned buttons inside `#table`, moved with CSS
//! transforms; the `--t` custom property carries the transition time.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

use super::{HudFields, Presenter};
use crate::consts::{CUP_HEIGHT, CUP_WIDTH};
use crate::error::RenderError;
use crate::sim::{CupId, GameSummary, RoundReport, SwapMotion, TableLayout};

type PickHandler = Rc<dyn Fn(CupId)>;

fn js_err(what: &str, e: JsValue) -> RenderError {
    RenderError(format!("{}: {:?}", what, e))
}

/// Resolve after `ms` milliseconds via `setTimeout`
pub async fn sleep(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Show one `.screen` section and hide the rest
pub fn show_screen(document: &Document, id: &str) {
    if let Ok(screens) = document.query_selector_all(".screen") {
        for i in 0..screens.length() {
            if let Some(el) = screens.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) {
                let _ = el.class_list().remove_1("active");
            }
        }
    }
    if let Some(el) = document.get_element_by_id(id) {
        let _ = el.class_list().add_1("active");
    }
}

pub struct DomPresenter {
    document: Document,
    table: HtmlElement,
    ball: HtmlElement,
    cups: RefCell<HashMap<CupId, HtmlElement>>,
    on_pick: RefCell<Option<PickHandler>>,
}

impl DomPresenter {
    pub fn new() -> Result<Self, RenderError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| RenderError("no document".to_string()))?;
        let table: HtmlElement = document
            .get_element_by_id("table")
            .ok_or_else(|| RenderError("no #table element".to_string()))?
            .dyn_into()
            .map_err(|_| RenderError("#table is not an HTML element".to_string()))?;
        let ball = Self::create(&document, "div", "ball")?;

        Ok(Self {
            document,
            table,
            ball,
            cups: RefCell::new(HashMap::new()),
            on_pick: RefCell::new(None),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Route cup clicks to `handler`
    pub fn on_user_pick(&self, handler: impl Fn(CupId) + 'static) {
        *self.on_pick.borrow_mut() = Some(Rc::new(handler));
    }

    fn create(document: &Document, tag: &str, class: &str) -> Result<HtmlElement, RenderError> {
        let el: HtmlElement = document
            .create_element(tag)
            .map_err(|e| js_err("create element", e))?
            .dyn_into()
            .map_err(|_| RenderError(format!("<{}> is not an HTML element", tag)))?;
        el.set_class_name(class);
        Ok(el)
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Move a cup so its centre lands on `center` over `ms`
    fn move_cup(cup: &HtmlElement, center: Vec2, ms: u32) -> Result<(), RenderError> {
        let top_left = center - Vec2::new(CUP_WIDTH / 2.0, CUP_HEIGHT / 2.0);
        let style = cup.style();
        style
            .set_property("--t", &format!("{}ms", ms))
            .and_then(|_| {
                style.set_property(
                    "transform",
                    &format!("translate({}px, {}px)", top_left.x, top_left.y),
                )
            })
            .map_err(|e| js_err("set cup transform", e))
    }

    fn cup(&self, id: CupId) -> Result<HtmlElement, RenderError> {
        self.cups
            .borrow()
            .get(&id)
            .cloned()
            .ok_or_else(|| RenderError(format!("no element for {:?}", id)))
    }
}

impl Presenter for DomPresenter {
    fn table_size(&self) -> Vec2 {
        Vec2::new(
            self.table.client_width() as f32,
            self.table.client_height() as f32,
        )
    }

    fn render_layout(&self, cups: &[CupId], layout: &TableLayout) -> Result<(), RenderError> {
        self.table.set_inner_html("");
        self.table
            .append_child(&self.ball)
            .map_err(|e| js_err("attach ball", e))?;

        let mut elements = HashMap::with_capacity(cups.len());
        for (slot, &cup) in cups.iter().enumerate() {
            let el = Self::create(&self.document, "button", "cup")?;
            let _ = el.set_attribute("aria-label", &format!("Cup {}", slot + 1));
            if let Some(center) = layout.slot_center(slot) {
                Self::move_cup(&el, center, 0)?;
            }

            let handler = self.on_pick.borrow().clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if let Some(handler) = &handler {
                    handler(cup);
                }
            });
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();

            self.table
                .append_child(&el)
                .map_err(|e| js_err("attach cup", e))?;
            elements.insert(cup, el);
        }

        *self.cups.borrow_mut() = elements;
        Ok(())
    }

    async fn animate_swap(&self, motion: &SwapMotion) -> Result<(), RenderError> {
        let first = self.cup(motion.first)?;
        let second = self.cup(motion.second)?;
        let leg = motion.leg_ms();

        // Rise to the shared apex...
        Self::move_cup(&first, motion.apex, leg)?;
        Self::move_cup(&second, motion.apex, leg)?;
        sleep(leg).await;

        // ...then drop into each other's slot
        Self::move_cup(&first, motion.to_first(), leg)?;
        Self::move_cup(&second, motion.to_second(), leg)?;
        sleep(leg).await;
        Ok(())
    }

    fn set_ball_visible(&self, visible: bool) -> Result<(), RenderError> {
        self.ball
            .class_list()
            .toggle_with_force("visible", visible)
            .map(|_| ())
            .map_err(|e| js_err("toggle ball", e))
    }

    fn set_ball_position(&self, _slot: usize, at: Vec2) -> Result<(), RenderError> {
        let style = self.ball.style();
        style
            .set_property("left", &format!("{}px", at.x))
            .and_then(|_| style.set_property("top", &format!("{}px", at.y)))
            .map_err(|e| js_err("place ball", e))
    }

    fn mark_pick(&self, cup: CupId, correct: bool) -> Result<(), RenderError> {
        let el = self.cup(cup)?;
        el.class_list()
            .add_2("lift", if correct { "success" } else { "fail" })
            .map_err(|e| js_err("mark cup", e))
    }

    fn clear_marks(&self) -> Result<(), RenderError> {
        for el in self.cups.borrow().values() {
            el.class_list()
                .remove_3("lift", "success", "fail")
                .map_err(|e| js_err("clear cup", e))?;
        }
        Ok(())
    }

    fn update_hud(&self, hud: &HudFields) -> Result<(), RenderError> {
        self.set_text("hudState", hud.phase_text);
        self.set_text("hudLevel", &hud.level.to_string());
        self.set_text("hudRound", &hud.round.to_string());
        self.set_text("hudScore", &hud.total_points.to_string());
        self.set_text("hudMiss", &hud.miss.to_string());
        Ok(())
    }

    fn round_finished(&self, report: &RoundReport) -> Result<(), RenderError> {
        let text = if report.correct {
            format!("Correct! +{}", report.points_awarded)
        } else {
            "Missed!".to_string()
        };
        self.notify(&text);
        Ok(())
    }

    fn game_over(&self, summary: &GameSummary) -> Result<(), RenderError> {
        let won_any = summary.score > 0;
        self.set_text("resultEmoji", if won_any { "🎉" } else { "❌" });
        self.set_text(
            "resultText",
            &format!(
                "{} of {} found",
                summary.score,
                summary.score + summary.miss_count
            ),
        );
        self.set_text("roundScore", &summary.score.to_string());
        self.set_text("totalScore", &summary.total_points.to_string());
        show_screen(&self.document, "screenResult");
        Ok(())
    }

    fn notify(&self, message: &str) {
        if let Some(toast) = self.document.get_element_by_id("toast") {
            toast.set_text_content(Some(message));
            let list = toast.class_list();
            let _ = list.remove_1("show");
            let _ = list.add_1("show");
        }
    }

    async fn wait(&self, ms: u32) {
        sleep(ms).await;
    }
}
