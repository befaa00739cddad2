//! Shell Game entry point
//!
//! Browser: wires the DOM to a `GameController`. Native: plays a headless game
//! with a random picker and prints the leaderboard.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Document, HtmlDialogElement, HtmlInputElement};

    use shell_game::leaderboard::format_age;
    use shell_game::persistence::LocalStorage;
    use shell_game::platform::{now_ms, session_seed};
    use shell_game::renderer::Presenter;
    use shell_game::renderer::dom::{DomPresenter, show_screen};
    use shell_game::{GameController, GameError, Leaderboard, Settings};

    /// Everything one page load needs
    struct App {
        controller: GameController<DomPresenter>,
        leaderboard: RefCell<Leaderboard<LocalStorage>>,
        settings: RefCell<Settings>,
        level: Cell<u8>,
    }

    impl App {
        fn document(&self) -> &Document {
            self.controller.presenter().document()
        }

        /// Expected conditions stay quiet; anything else reaches the player
        fn report(&self, result: Result<(), GameError>) {
            match result {
                Ok(()) => {}
                Err(e @ (GameError::NotReady | GameError::RevealUsed)) => {
                    log::debug!("Ignored: {}", e);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    self.controller.presenter().notify(&e.to_string());
                }
            }
        }

        fn start(self: &Rc<Self>) {
            show_screen(self.document(), "screenGame");
            let app = self.clone();
            spawn_local(async move {
                let level = app.level.get();
                let result = app.controller.start(level).await;
                app.report(result);
            });
        }

        fn refresh_leaderboard(&self) {
            let Some(list) = self.document().get_element_by_id("leaderboardList") else {
                return;
            };
            list.set_inner_html("");

            let size = self.settings.borrow().leaderboard_size;
            let now = now_ms();
            for (i, entry) in self.leaderboard.borrow().ranked_top(size).iter().enumerate() {
                if let Ok(li) = self.document().create_element("li") {
                    li.set_text_content(Some(&format!(
                        "{}. {} - {} pts, {} hit / {} miss ({})",
                        i + 1,
                        entry.name,
                        entry.total_points,
                        entry.score,
                        entry.miss_count,
                        format_age(now, entry.timestamp)
                    )));
                    let _ = list.append_child(&li);
                }
            }

            if let Some(best) = self.leaderboard.borrow().best() {
                if let Some(el) = self.document().get_element_by_id("bestScore") {
                    el.set_text_content(Some(&format!("{} ({})", best.score, best.name)));
                }
            }
        }

        fn show_leaderboard(&self) {
            self.refresh_leaderboard();
            if let Some(dialog) = self
                .document()
                .get_element_by_id("leaderboardDialog")
                .and_then(|el| el.dyn_into::<HtmlDialogElement>().ok())
            {
                let _ = dialog.show_modal();
            }
        }

        fn save_score(&self) {
            let name = self
                .document()
                .get_element_by_id("playerName")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();

            let Some(entry) = self.controller.entry_for(&name, now_ms()) else {
                return;
            };

            let saved = self.leaderboard.borrow_mut().append(entry.clone());
            match saved {
                Ok(rank) => {
                    self.controller
                        .presenter()
                        .notify(&format!("Saved! {} is #{}", entry.name, rank));
                    self.show_leaderboard();
                }
                Err(e) => {
                    // The session keeps its totals; the player can retry
                    log::warn!("{}", e);
                    self.controller
                        .presenter()
                        .notify("Couldn't save your score, try again");
                }
            }

            let mut settings = self.settings.borrow_mut();
            settings.player_name = entry.name;
            settings.last_level = self.level.get();
            if let Err(e) = settings.save(&mut LocalStorage) {
                log::warn!("Settings not saved: {}", e);
            }
        }
    }

    fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        if let Some(el) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| handler());
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("Missing #{}", id);
        }
    }

    fn setup_stage_cards(app: &Rc<App>) {
        let document = app.document().clone();
        let Ok(cards) = document.query_selector_all(".stage-card") else {
            return;
        };

        for i in 0..cards.length() {
            let Some(card) = cards.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            let Some(level) = card
                .get_attribute("data-level")
                .and_then(|l| l.parse::<u8>().ok())
            else {
                continue;
            };

            if level == app.level.get() {
                let _ = card.class_list().add_1("selected");
            }

            let app = app.clone();
            let document = document.clone();
            let card_clone = card.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Ok(all) = document.query_selector_all(".stage-card") {
                    for j in 0..all.length() {
                        if let Some(el) =
                            all.item(j).and_then(|n| n.dyn_into::<web_sys::Element>().ok())
                        {
                            let _ = el.class_list().remove_1("selected");
                            let _ = el.set_attribute("aria-checked", "false");
                        }
                    }
                }
                let _ = card_clone.class_list().add_1("selected");
                let _ = card_clone.set_attribute("aria-checked", "true");
                app.level.set(level);
                log::info!("Level {} selected", level);
            });
            let _ = card.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(app: &Rc<App>) {
        let document = app.document().clone();

        {
            let app = app.clone();
            on_click(&document, "btnStart", move || app.start());
        }
        {
            let app = app.clone();
            on_click(&document, "btnRetry", move || app.start());
        }
        {
            let app = app.clone();
            on_click(&document, "btnShuffle", move || {
                let app = app.clone();
                spawn_local(async move {
                    let result = app.controller.shuffle().await;
                    app.report(result);
                });
            });
        }
        {
            let app = app.clone();
            on_click(&document, "btnReveal", move || {
                let app = app.clone();
                spawn_local(async move {
                    let result = app.controller.reveal().await;
                    app.report(result);
                });
            });
        }
        for id in ["btnQuit", "btnHome"] {
            let app = app.clone();
            on_click(&document, id, move || {
                app.controller.reset();
                show_screen(app.document(), "screenHome");
            });
        }
        {
            let app = app.clone();
            on_click(&document, "btnShowLeaderboard", move || app.show_leaderboard());
        }

        if let Some(form) = document.get_element_by_id("saveScoreForm") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                app.save_score();
            });
            let _ = form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("logger init failed: {}", e).into());
        }

        log::info!("Shell Game starting...");

        let presenter = match DomPresenter::new() {
            Ok(p) => p,
            Err(e) => {
                log::error!("Cannot start: {}", e);
                return;
            }
        };

        let settings = Settings::load(&LocalStorage);
        let seed = session_seed();
        let controller = GameController::new(presenter, seed, settings.rounds_per_game);
        log::info!("Session seeded with {}", seed);

        if let Some(input) = controller
            .presenter()
            .document()
            .get_element_by_id("playerName")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_value(&settings.player_name);
        }

        let app = Rc::new(App {
            controller,
            leaderboard: RefCell::new(Leaderboard::new(LocalStorage)),
            level: Cell::new(settings.last_level),
            settings: RefCell::new(settings),
        });

        // Cup clicks hold a weak handle so the presenter doesn't keep the app alive
        let weak = Rc::downgrade(&app);
        app.controller.presenter().on_user_pick(move |cup| {
            if let Some(app) = weak.upgrade() {
                spawn_local(async move {
                    let result = app.controller.pick(cup).await;
                    app.report(result);
                });
            }
        });

        setup_stage_cards(&app);
        setup_buttons(&app);
        app.refresh_leaderboard();

        log::info!("Shell Game ready!");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let level = std::env::args()
        .nth(1)
        .and_then(|a| a.parse::<u8>().ok())
        .unwrap_or(1);

    if let Err(e) = pollster::block_on(native::autoplay(level)) {
        eprintln!("shell-game: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use shell_game::leaderboard::format_age;
    use shell_game::persistence::MemoryStorage;
    use shell_game::platform::{now_ms, session_seed};
    use shell_game::renderer::HeadlessPresenter;
    use shell_game::sim::GameRng;
    use shell_game::{GameController, GameError, Leaderboard, RoundPhase, Settings};

    /// Play one game picking cups at random, then save and print the result
    pub async fn autoplay(level: u8) -> Result<(), GameError> {
        let settings = Settings::default();
        let seed = session_seed();
        let controller =
            GameController::new(HeadlessPresenter::default(), seed, settings.rounds_per_game);
        let mut guesser = GameRng::new(seed.rotate_left(17));

        log::info!("Shell Game (native) autoplay, level {}, seed {}", level, seed);
        controller.start(level).await?;

        while controller.phase() != RoundPhase::Ended {
            controller.shuffle().await?;
            let cups = controller.cups();
            let guess = cups[guesser.index(cups.len())];
            controller.pick(guess).await?;
        }

        let mut leaderboard = Leaderboard::new(MemoryStorage::new());
        if let Some(entry) = controller.entry_for("autoplay", now_ms()) {
            let rank = leaderboard.append(entry)?;
            log::info!("Saved at rank {}", rank);
        }

        if let Some(summary) = controller.summary() {
            println!(
                "Level {}: {} found, {} missed, {} points over {} rounds",
                summary.level,
                summary.score,
                summary.miss_count,
                summary.total_points,
                summary.rounds_played
            );
        }
        let now = now_ms();
        for (i, e) in leaderboard
            .ranked_top(settings.leaderboard_size)
            .iter()
            .enumerate()
        {
            println!(
                "{}. {} - {} pts ({})",
                i + 1,
                e.name,
                e.total_points,
                format_age(now, e.timestamp)
            );
        }
        Ok(())
    }
}
