use std::{cell::Cell, path::Path, sync::Arc};

use windows::core::{w, IUnknown, Interface, BSTR, GUID, HSTRING, PCWSTR, VARIANT};
use windows::Win32::Foundation::DISP_E_UNKNOWNNAME;
use windows::Win32::System::Com::{
    CLSIDFromProgID, CoCreateInstance, CoInitializeEx, IDispatch, CLSCTX_LOCAL_SERVER,
    COINIT_MULTITHREADED, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET,
    DISPATCH_PROPERTYPUT, DISPPARAMS,
};
use windows::Win32::System::Ole::DISPID_PROPERTYPUT;

use super::{
    Artwork, ArtworkCollection, Connector, PlayerHandle, PlayerState, RatingKind, RepeatMode,
    TrackHandle,
};
use crate::error::Fault;

const LOCALE_USER_DEFAULT: u32 = 0x0400;
const RATING_KIND_USER: i32 = 0;

thread_local! {
    static COM_READY: Cell<bool> = const { Cell::new(false) };
}

fn interop(error: windows::core::Error) -> Fault {
    Fault::Interop(error.to_string())
}

/// Joins the multithreaded apartment once per thread that talks to iTunes.
fn ensure_com() {
    COM_READY.with(|ready| {
        if !ready.get() {
            // An STA thread reports RPC_E_CHANGED_MODE; COM is usable either way.
            let _ = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
            ready.set(true);
        }
    });
}

/// Late-bound automation object.
#[derive(Clone)]
struct Dispatch(IDispatch);

// The objects are proxies to an out-of-process server created in the MTA,
// which any MTA thread may call.
unsafe impl Send for Dispatch {}
unsafe impl Sync for Dispatch {}

impl Dispatch {
    fn dispid(&self, name: &str) -> windows::core::Result<i32> {
        let wide = HSTRING::from(name);
        let names = [PCWSTR(wide.as_ptr())];
        let mut dispid = 0;
        unsafe {
            self.0.GetIDsOfNames(
                &GUID::zeroed(),
                names.as_ptr(),
                1,
                LOCALE_USER_DEFAULT,
                &mut dispid,
            )?;
        }
        Ok(dispid)
    }

    fn invoke(
        &self,
        dispid: i32,
        flags: DISPATCH_FLAGS,
        mut args: Vec<VARIANT>,
    ) -> Result<VARIANT, Fault> {
        ensure_com();
        // Dispatch arguments travel right to left.
        args.reverse();
        let mut named = DISPID_PROPERTYPUT;
        let is_put = flags == DISPATCH_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: args.as_mut_ptr(),
            rgdispidNamedArgs: if is_put {
                &mut named
            } else {
                std::ptr::null_mut()
            },
            cArgs: u32::try_from(args.len()).unwrap_or(u32::MAX),
            cNamedArgs: u32::from(is_put),
        };
        let mut result = VARIANT::default();
        unsafe {
            self.0
                .Invoke(
                    dispid,
                    &GUID::zeroed(),
                    LOCALE_USER_DEFAULT,
                    flags,
                    &params,
                    Some(&mut result),
                    None,
                    None,
                )
                .map_err(interop)?;
        }
        Ok(result)
    }

    fn call(
        &self,
        name: &str,
        flags: DISPATCH_FLAGS,
        args: Vec<VARIANT>,
    ) -> Result<VARIANT, Fault> {
        ensure_com();
        let dispid = self.dispid(name).map_err(interop)?;
        self.invoke(dispid, flags, args)
    }

    fn get(&self, name: &str) -> Result<VARIANT, Fault> {
        self.call(name, DISPATCH_PROPERTYGET, Vec::new())
    }

    fn put(&self, name: &str, value: VARIANT) -> Result<(), Fault> {
        self.call(name, DISPATCH_PROPERTYPUT, vec![value]).map(drop)
    }

    fn method(&self, name: &str) -> Result<(), Fault> {
        self.call(name, DISPATCH_METHOD, Vec::new()).map(drop)
    }

    fn get_i32(&self, name: &str) -> Result<i32, Fault> {
        i32::try_from(&self.get(name)?).map_err(interop)
    }

    fn get_bool(&self, name: &str) -> Result<bool, Fault> {
        bool::try_from(&self.get(name)?).map_err(interop)
    }

    fn get_string(&self, name: &str) -> Result<String, Fault> {
        let value = self.get(name)?;
        if value.is_empty() {
            return Ok(String::new());
        }
        BSTR::try_from(&value)
            .map(|s| s.to_string())
            .map_err(interop)
    }

    fn get_object(&self, name: &str) -> Result<Option<Dispatch>, Fault> {
        object(&self.get(name)?)
    }
}

fn object(value: &VARIANT) -> Result<Option<Dispatch>, Fault> {
    if value.is_empty() {
        return Ok(None);
    }
    // A null dispatch pointer does not convert; iTunes uses it for "nothing".
    let Ok(unknown) = IUnknown::try_from(value) else {
        return Ok(None);
    };
    unknown
        .cast::<IDispatch>()
        .map(|dispatch| Some(Dispatch(dispatch)))
        .map_err(interop)
}

#[derive(Default)]
pub struct ITunesConnector {}

impl ITunesConnector {
    pub fn new() -> Self {
        Self {}
    }
}

impl Connector for ITunesConnector {
    fn connect(&self) -> Result<Arc<dyn PlayerHandle>, Fault> {
        ensure_com();
        let app: IDispatch = unsafe {
            let clsid = CLSIDFromProgID(w!("iTunes.Application")).map_err(interop)?;
            CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER).map_err(interop)?
        };
        Ok(Arc::new(ITunesApp(Dispatch(app))))
    }
}

struct ITunesApp(Dispatch);

impl ITunesApp {
    fn playlist(&self) -> Result<Dispatch, Fault> {
        self.0
            .get_object("CurrentPlaylist")?
            .ok_or_else(|| Fault::Interop("no current playlist".to_string()))
    }
}

impl PlayerHandle for ITunesApp {
    fn player_state(&self) -> Result<PlayerState, Fault> {
        self.0.get_i32("PlayerState").map(PlayerState)
    }

    fn player_position_ms(&self) -> Result<i32, Fault> {
        self.0.get_i32("PlayerPositionMS")
    }

    fn set_player_position_ms(&self, position: i32) -> Result<(), Fault> {
        self.0.put("PlayerPositionMS", VARIANT::from(position))
    }

    fn sound_volume(&self) -> Result<i32, Fault> {
        self.0.get_i32("SoundVolume")
    }

    fn set_sound_volume(&self, volume: i32) -> Result<(), Fault> {
        self.0.put("SoundVolume", VARIANT::from(volume))
    }

    fn shuffle(&self) -> Result<bool, Fault> {
        self.playlist()?.get_bool("Shuffle")
    }

    fn set_shuffle(&self, shuffle: bool) -> Result<(), Fault> {
        self.playlist()?.put("Shuffle", VARIANT::from(shuffle))
    }

    fn song_repeat(&self) -> Result<RepeatMode, Fault> {
        RepeatMode::from_raw(self.playlist()?.get_i32("SongRepeat")?)
    }

    fn set_song_repeat(&self, mode: RepeatMode) -> Result<(), Fault> {
        let playlist = self.playlist()?;
        playlist.put("SongRepeat", VARIANT::from(mode.as_raw()))
    }

    fn play(&self) -> Result<(), Fault> {
        self.0.method("Play")
    }

    fn pause(&self) -> Result<(), Fault> {
        self.0.method("Pause")
    }

    fn next_track(&self) -> Result<(), Fault> {
        self.0.method("NextTrack")
    }

    fn previous_track(&self) -> Result<(), Fault> {
        self.0.method("PreviousTrack")
    }

    fn current_track(&self) -> Result<Option<Box<dyn TrackHandle>>, Fault> {
        let track = self.0.get_object("CurrentTrack")?;
        Ok(track.map(|track| Box::new(ITunesTrack(track)) as Box<dyn TrackHandle>))
    }
}

struct ITunesTrack(Dispatch);

impl TrackHandle for ITunesTrack {
    fn album(&self) -> Result<String, Fault> {
        self.0.get_string("Album")
    }

    fn artist(&self) -> Result<String, Fault> {
        self.0.get_string("Artist")
    }

    fn duration_secs(&self) -> Result<i32, Fault> {
        self.0.get_i32("Duration")
    }

    fn name(&self) -> Result<String, Fault> {
        self.0.get_string("Name")
    }

    fn rating_kind(&self) -> Result<Option<RatingKind>, Fault> {
        // Only file and CD tracks expose ratingKind.
        let dispid = match self.0.dispid("ratingKind") {
            Ok(dispid) => dispid,
            Err(e) if e.code() == DISP_E_UNKNOWNNAME => return Ok(None),
            Err(e) => return Err(interop(e)),
        };
        let kind = i32::try_from(&self.0.invoke(dispid, DISPATCH_PROPERTYGET, Vec::new())?)
            .map_err(interop)?;
        Ok(Some(if kind == RATING_KIND_USER {
            RatingKind::User
        } else {
            RatingKind::Computed
        }))
    }

    fn artwork(&self) -> Result<Box<dyn ArtworkCollection>, Fault> {
        let Some(collection) = self.0.get_object("Artwork")? else {
            return Err(Fault::Interop("track has no artwork collection".to_string()));
        };
        Ok(Box::new(ITunesArtworkCollection(collection)))
    }
}

struct ITunesArtworkCollection(Dispatch);

impl ArtworkCollection for ITunesArtworkCollection {
    fn len(&self) -> Result<usize, Fault> {
        let count = self.0.get_i32("Count")?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn get(&self, index: usize) -> Result<Box<dyn Artwork>, Fault> {
        // iTunes collections are addressed from 1.
        let position = i32::try_from(index + 1)
            .map_err(|_| Fault::Interop(format!("artwork index {index} out of range")))?;
        let item = self.0.call("Item", DISPATCH_PROPERTYGET, vec![VARIANT::from(position)])?;
        let artwork = object(&item)?
            .ok_or_else(|| Fault::Interop(format!("no artwork at index {index}")))?;
        Ok(Box::new(ITunesArtwork(artwork)))
    }
}

struct ITunesArtwork(Dispatch);

impl Artwork for ITunesArtwork {
    fn save_to_file(&self, path: &Path) -> Result<(), Fault> {
        let path = BSTR::from(path.to_string_lossy().as_ref());
        self.0
            .call("SaveArtworkToFile", DISPATCH_METHOD, vec![VARIANT::from(path)])
            .map(drop)
    }
}
