mod actions;
mod events;
mod hud;
mod pack;
mod player;
mod scene;
mod systems;
mod vitals;

use engine::Scene;

use crate::app::tuning::GameTuning;

pub(crate) use scene::GameplayScene;

pub(crate) fn build_scene(tuning: GameTuning) -> Box<dyn Scene> {
    Box::new(GameplayScene::new(tuning))
}

#[cfg(test)]
mod tests;
