//! SDL2 pixel backend for the display (cargo feature `graphics`).
//!
//! The core rasterizes each frame to RGB24; this backend only streams
//! the buffer into a scaled window texture. Closing the window requests
//! a clean exit, like ctrl-d on the terminal.

use anyhow::anyhow;
use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};

use dcpu16_core::device::lem::{Frame, Screen};
use dcpu16_core::machine;

const SCALE: u32 = 4;

pub struct SdlScreen {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    event_pump: EventPump,
    buffer: Vec<u8>,
}

impl SdlScreen {
    pub fn new() -> anyhow::Result<Self> {
        let sdl = sdl2::init().map_err(|e| anyhow!("unable to init sdl: {e}"))?;
        let video = sdl.video().map_err(|e| anyhow!("unable to init sdl video: {e}"))?;
        let event_pump = sdl
            .event_pump()
            .map_err(|e| anyhow!("unable to get sdl event pump: {e}"))?;

        let window = video
            .window(
                "DCPU-16 LEM-1802",
                Frame::WIDTH as u32 * SCALE,
                Frame::HEIGHT as u32 * SCALE,
            )
            .position_centered()
            .build()?;

        let canvas = window.into_canvas().accelerated().build()?;
        let texture_creator = canvas.texture_creator();

        Ok(Self {
            canvas,
            texture_creator,
            event_pump,
            buffer: vec![0; Frame::WIDTH * Frame::HEIGHT * 3],
        })
    }

    fn pump_events(&mut self) {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => machine::request_die(),
                Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => machine::request_break(),
                _ => {}
            }
        }
    }
}

impl Screen for SdlScreen {
    fn redraw(&mut self, frame: &Frame) {
        self.pump_events();
        frame.rasterize(&mut self.buffer);

        let Ok(mut texture) = self.texture_creator.create_texture_streaming(
            PixelFormatEnum::RGB24,
            Frame::WIDTH as u32,
            Frame::HEIGHT as u32,
        ) else {
            return;
        };
        if texture.update(None, &self.buffer, Frame::WIDTH * 3).is_err() {
            return;
        }

        self.canvas.clear();
        let _ = self.canvas.copy(&texture, None, None);
        self.canvas.present();
    }
}
