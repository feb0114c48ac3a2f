use std::collections::BTreeSet;

use crate::{FigureHandle, Grid, PolysurfError, RenderPipeline, Surface};

#[allow(dead_code)]
pub fn init_test_logger() {
    use std::io::Write as _;
    let _ = env_logger::builder()
        .is_test(true)
        .format(|buf, record| {
            // Ansi256 ref: https://hexdocs.pm/color_palette/ansi_color_codes.html
            let bg = anstyle::Ansi256Color(236);
            let level_style = buf
                .default_level_style(record.level())
                .bg_color(Some(bg.into()));
            let dim = anstyle::Ansi256Color(250).on(bg);

            let module = record.module_path().unwrap_or("unknown");
            let module = module.rsplit("::").next().unwrap_or(module);
            writeln!(
                buf,
                "{dim}[{dim:#}{level_style}{}{level_style:#}{dim} {}:{}]{dim:#} {}",
                record.level(),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init();
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCall {
    Render {
        labels: Vec<String>,
        shape: (usize, usize),
    },
    Dispose(FigureHandle),
}

/// Render pipeline that records calls and tracks which figures are live.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
    pub live: BTreeSet<FigureHandle>,
    pub max_live: usize,
    next_id: u64,
}

impl RenderPipeline for RecordingRenderer {
    fn render(
        &mut self,
        panels: &[(Surface, String)],
        grid: &Grid,
    ) -> Result<FigureHandle, PolysurfError> {
        self.calls.push(RenderCall::Render {
            labels: panels.iter().map(|(_, label)| label.clone()).collect(),
            shape: grid.shape(),
        });
        let figure = FigureHandle::new(self.next_id);
        self.next_id += 1;
        self.live.insert(figure);
        self.max_live = self.max_live.max(self.live.len());
        Ok(figure)
    }

    fn dispose(&mut self, figure: FigureHandle) -> Result<(), PolysurfError> {
        self.calls.push(RenderCall::Dispose(figure));
        if !self.live.remove(&figure) {
            return Err(PolysurfError::UnknownFigure { id: figure.id() });
        }
        Ok(())
    }
}
